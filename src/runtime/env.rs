//! Per-call environment construction for the runtime's request metadata
//! protocol.

use crate::bridge::BridgedRequest;
use crate::config::HostConfig;
use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Process-wide runtime environment: server identity, persisted-layout
/// paths, and the application encryption key. Built once at startup, cloned
/// and extended per request.
#[derive(Debug, Clone)]
pub struct RuntimeEnv {
    base: BTreeMap<String, String>,
}

impl RuntimeEnv {
    pub fn new(config: &HostConfig) -> Result<Self> {
        let app_key = load_or_generate_app_key(&config.app_key_file())?;

        let mut base = BTreeMap::new();
        let set = |base: &mut BTreeMap<String, String>, k: &str, v: String| {
            base.insert(k.to_owned(), v);
        };

        // Server identity: the surface believes it talks to a local origin.
        set(&mut base, "REMOTE_ADDR", "127.0.0.1".into());
        set(&mut base, "SERVER_NAME", "127.0.0.1".into());
        set(&mut base, "SERVER_PORT", "80".into());
        set(&mut base, "SERVER_PROTOCOL", "HTTP/1.1".into());
        set(&mut base, "REQUEST_SCHEME", "http".into());

        set(&mut base, "APP_URL", config.origin.clone());
        set(&mut base, "ASSET_URL", format!("{}/_assets", config.origin));
        set(&mut base, "APP_KEY", app_key);

        // Persisted-state layout.
        let path = |p: std::path::PathBuf| p.to_string_lossy().into_owned();
        set(&mut base, "DOCUMENT_ROOT", path(config.live_dir()));
        set(&mut base, "STORAGE_PATH", path(config.storage_dir()));
        set(&mut base, "VIEW_COMPILED_PATH", path(config.views_dir()));
        set(&mut base, "DB_CONNECTION", "sqlite".into());
        set(&mut base, "DB_DATABASE", path(config.database_file()));
        set(&mut base, "CACHE_STORE", "file".into());
        set(&mut base, "SESSION_DRIVER", "file".into());
        set(&mut base, "SESSION_SAVE_PATH", path(config.sessions_dir()));

        Ok(Self { base })
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.base
    }

    /// Base environment extended with the request's metadata: CGI fields plus
    /// one `HTTP_<UPPER_SNAKE>` variable per header. The `Cookie` and CSRF
    /// headers are expected to already be finalized on the request.
    pub fn for_request(&self, request: &BridgedRequest) -> BTreeMap<String, String> {
        let mut env = self.base.clone();

        env.insert("REQUEST_METHOD".into(), request.method.clone());
        env.insert("REQUEST_URI".into(), request.uri());
        env.insert("PATH_INFO".into(), request.path.clone());
        env.insert("QUERY_STRING".into(), request.query_string());

        for (name, value) in request.headers.iter() {
            env.insert(header_env_name(name), value.to_owned());
        }

        if let Some(body) = &request.body {
            env.insert("CONTENT_LENGTH".into(), body.len().to_string());
            let content_type = request
                .headers
                .get("Content-Type")
                .unwrap_or("application/x-www-form-urlencoded");
            env.insert("CONTENT_TYPE".into(), content_type.to_owned());
        }

        env
    }
}

/// `X-Requested-With` → `HTTP_X_REQUESTED_WITH`.
fn header_env_name(header: &str) -> String {
    let mut name = String::with_capacity(header.len() + 5);
    name.push_str("HTTP_");
    for ch in header.chars() {
        match ch {
            '-' => name.push('_'),
            _ => name.push(ch.to_ascii_uppercase()),
        }
    }
    name
}

/// Read the persisted application key, or mint one (`base64:` + 32 random
/// bytes) when the file is missing or holds something that is not a key.
pub fn load_or_generate_app_key(path: &Path) -> Result<String> {
    if let Ok(contents) = fs::read_to_string(path) {
        let contents = contents.trim();
        if contents.starts_with("base64:") {
            return Ok(contents.to_owned());
        }
        tracing::warn!("invalid app key on disk, regenerating");
    }

    let mut secret = [0u8; 32];
    rand::rng().fill_bytes(&mut secret);
    let key = format!("base64:{}", BASE64.encode(secret));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create app key directory")?;
    }
    fs::write(path, &key).context("Failed to persist app key")?;
    tracing::info!("🔐 generated new application key");
    Ok(key)
}
