//! Persistent cookie jar mirroring the runtime's session cookies.
//!
//! The jar is the bridge's source of truth for session identity. Every entry
//! is also mirrored into the surface's native cookie storage through
//! [`CookieMirror`] so browser-level requests carry it too.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Seam to the web surface's native cookie storage.
pub trait CookieMirror: Send + Sync {
    /// Mirror one raw `Set-Cookie` value for the given origin.
    fn set_cookie(&self, origin: &str, raw: &str);

    /// Push pending writes down to the platform store.
    fn flush(&self) {}
}

/// Mirror that drops everything; used headless and in tests.
pub struct NoopMirror;

impl CookieMirror for NoopMirror {
    fn set_cookie(&self, _origin: &str, _raw: &str) {}
}

/// Name→value jar, keyed by name only (last write wins), persisted as a JSON
/// object so it survives process restarts.
pub struct CookieJar {
    path: PathBuf,
    cookies: Mutex<BTreeMap<String, String>>,
}

impl CookieJar {
    /// Load the jar from durable storage. A missing or corrupt file starts
    /// an empty jar rather than failing startup.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cookies = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            path,
            cookies: Mutex::new(cookies),
        }
    }

    /// Store one cookie from a raw `Set-Cookie` value (`name=value; attrs`).
    /// Attributes past the first `;` are dropped; the jar only tracks the
    /// pair itself. Returns the stored name when the value parsed.
    pub fn store_from_set_cookie(&self, header: &str) -> Option<String> {
        let pair = header.split(';').next().unwrap_or_default();
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            return None;
        }

        let snapshot = {
            let mut cookies = self.cookies.lock().unwrap_or_else(|e| e.into_inner());
            cookies.insert(name.to_owned(), value.to_owned());
            cookies.clone()
        };
        tracing::debug!(cookie = name, "🍪 stored cookie");
        self.persist(&snapshot);
        Some(name.to_owned())
    }

    /// Serialize the jar as a single `Cookie` header value.
    pub fn header_value(&self) -> String {
        let cookies = self.cookies.lock().unwrap_or_else(|e| e.into_inner());
        cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.cookies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Explicit reset; the only way entries leave the jar.
    pub fn clear(&self) {
        let mut cookies = self.cookies.lock().unwrap_or_else(|e| e.into_inner());
        cookies.clear();
        self.persist(&cookies);
    }

    /// Persistence is fire-and-forget: a failed write costs the next launch
    /// its session, not this one.
    fn persist(&self, cookies: &BTreeMap<String, String>) {
        match serde_json::to_string_pretty(cookies) {
            Ok(json) => {
                if let Err(error) = std::fs::write(&self.path, json) {
                    tracing::warn!(%error, "failed to persist cookie jar");
                }
            }
            Err(error) => tracing::warn!(%error, "failed to serialize cookie jar"),
        }
    }
}
