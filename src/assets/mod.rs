//! Static asset resolution.
//!
//! A performance shortcut in front of the bridge: if the requested path maps
//! to a file under the bundled public tree it is served directly, otherwise
//! control falls through to the runtime, which remains the authority on
//! asset existence.

use crate::bridge::HeaderMap;
use std::path::{Path, PathBuf};

/// Namespace prefix the surface uses for bundled assets.
pub const ASSET_NAMESPACE: &str = "/_assets/";

const STATIC_EXTENSIONS: &[&str] = &[
    ".js", ".css", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".woff", ".woff2", ".ttf", ".eot",
    ".ico", ".json", ".map",
];

/// A resolved on-disk asset ready to stream to the surface.
#[derive(Debug, Clone)]
pub struct LocalAsset {
    pub path: PathBuf,
    pub mime: &'static str,
    pub len: u64,
}

impl LocalAsset {
    /// Headers for serving the file: content type, a one-day cache policy,
    /// and a CORS grant for cross-origin font loading.
    pub fn response_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", self.mime);
        headers.insert("Cache-Control", "max-age=86400, public");
        headers.insert("Content-Length", self.len.to_string());
        if self.mime.starts_with("font/") || self.mime == "application/vnd.ms-fontobject" {
            headers.insert("Access-Control-Allow-Origin", "*");
        }
        headers
    }
}

pub struct AssetResolver {
    public_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(public_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
        }
    }

    /// Probe the candidate locations for a requested path; first existing
    /// file wins. `None` means the bridge should handle the request.
    pub fn resolve(&self, path: &str) -> Option<LocalAsset> {
        let stripped = strip_namespace(path);
        let clean = stripped.split('?').next().unwrap_or(stripped);
        if clean.is_empty() || clean.contains("..") {
            return None;
        }

        let candidates = [
            self.public_dir.join(stripped),
            self.public_dir.join(clean),
            self.public_dir.join("vendor").join(clean),
            self.public_dir.join("build").join(clean),
        ];

        let file = candidates.iter().find(|p| p.is_file())?;
        let len = std::fs::metadata(file).ok()?.len();
        tracing::debug!(path = %file.display(), "serving static asset");
        Some(LocalAsset {
            path: file.clone(),
            mime: mime_for(clean),
            len,
        })
    }

    /// Heuristic used when routing intercepted requests: does this look like
    /// a static asset rather than an application route?
    pub fn is_static_request(path: &str) -> bool {
        if path.contains("_assets")
            || path.contains("/js/")
            || path.contains("/css/")
            || path.contains("/fonts/")
            || path.contains("/images/")
        {
            return true;
        }
        STATIC_EXTENSIONS
            .iter()
            .any(|ext| path.ends_with(ext) || path.contains(&format!("{ext}?")))
    }
}

/// Drop the asset namespace or the leading slash; lookups are relative to
/// the public tree.
fn strip_namespace(path: &str) -> &str {
    if let Some(idx) = path.find(ASSET_NAMESPACE) {
        &path[idx + ASSET_NAMESPACE.len()..]
    } else {
        path.trim_start_matches('/')
    }
}

/// Fixed extension→MIME table with an octet-stream fallback.
pub fn mime_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "xml" => "application/xml",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        "otf" => "font/otf",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}
