//! Version manifest: `APP_VERSION` / `CHANNEL_ID` lines in a packaged
//! `.env`-style file, plus the applied-update marker.
//!
//! The parser is deliberately a line-oriented key=value scan: the archive's
//! authoring tool controls the file's shape, and any line that does not
//! match is ignored.

use crate::error::ManifestError;
use std::fs;
use std::io::Read;
use std::path::Path;

pub const VERSION_KEY: &str = "APP_VERSION";
pub const CHANNEL_KEY: &str = "CHANNEL_ID";

/// Name of the environment file, both on disk and inside an archive.
pub const ENV_FILE_NAME: &str = ".env";

/// Installed version and optional update-channel identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionManifest {
    pub version: Option<String>,
    pub channel: Option<String>,
}

/// Scan environment-file content for the manifest keys.
pub fn parse_env(content: &str) -> VersionManifest {
    let mut manifest = VersionManifest::default();
    for line in content.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix(VERSION_KEY).and_then(strip_assign) {
            manifest.version = Some(value.to_owned());
        } else if let Some(value) = line.strip_prefix(CHANNEL_KEY).and_then(strip_assign) {
            manifest.channel = Some(value.to_owned());
        }
    }
    manifest
}

fn strip_assign(rest: &str) -> Option<&str> {
    let value = rest.strip_prefix('=')?.trim();
    (!value.is_empty()).then_some(value)
}

/// Read the manifest from an installed environment file.
pub fn read_env_file(path: &Path) -> Result<VersionManifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    Ok(parse_env(&content))
}

/// Read the manifest straight out of a packaged archive, without extracting.
pub fn read_bundled(bundle: &Path) -> Result<VersionManifest, ManifestError> {
    let file = fs::File::open(bundle)
        .map_err(|e| ManifestError::BundleUnreadable(format!("{}: {e}", bundle.display())))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ManifestError::BundleUnreadable(e.to_string()))?;
    let mut entry = archive
        .by_name(ENV_FILE_NAME)
        .map_err(|e| ManifestError::BundleUnreadable(format!("no {ENV_FILE_NAME} entry: {e}")))?;

    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| ManifestError::BundleUnreadable(e.to_string()))?;
    Ok(parse_env(&content))
}

/// Rewrite the version field in place when present, append it otherwise.
pub fn rewrite_version(env_file: &Path, new_version: &str) -> Result<(), ManifestError> {
    let content = fs::read_to_string(env_file).unwrap_or_default();
    let assignment = format!("{VERSION_KEY}={new_version}");

    let mut replaced = false;
    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            if line.trim_start().starts_with(&format!("{VERSION_KEY}=")) {
                replaced = true;
                assignment.clone()
            } else {
                line.to_owned()
            }
        })
        .collect();
    if !replaced {
        lines.push(assignment);
    }

    fs::write(env_file, lines.join("\n") + "\n")?;
    Ok(())
}

// ─── Applied-update marker ───────────────────────────────────────────────────

/// Applied version recorded by the marker, if one exists.
pub fn read_marker(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let version = content.trim();
    (!version.is_empty()).then(|| version.to_owned())
}

/// Written only after an update archive has been fully extracted; presence
/// means "do not re-extract the bundled archive".
pub fn write_marker(path: &Path, version: &str) -> Result<(), ManifestError> {
    fs::write(path, version)?;
    Ok(())
}

/// Best-effort removal, used when falling back to the shipped version.
pub fn clear_marker(path: &Path) {
    if path.exists() {
        if let Err(error) = fs::remove_file(path) {
            tracing::warn!(%error, "failed to remove update marker");
        }
    }
}
