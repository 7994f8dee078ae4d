//! Last-known anti-forgery token, applied to every outgoing request.
//!
//! No expiry is tracked. A stale token simply earns the next bridged request
//! a token-mismatch response, which the decoder maps to the distinguished
//! "page expired" status.

use crate::bridge::HeaderMap;
use std::sync::Mutex;

/// Outgoing header aliases the token is applied under.
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";
pub const XSRF_HEADER: &str = "X-XSRF-TOKEN";

const TOKEN_FIELD: &str = "_token";

/// Single-value token cache, last write wins.
#[derive(Default)]
pub struct CsrfGuard {
    token: Mutex<Option<String>>,
}

impl CsrfGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        tracing::debug!("🔑 stored CSRF token");
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token);
    }

    pub fn get(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Pull a token out of an outgoing POST/PATCH/PUT body. Handles a JSON
    /// `_token` key and a `_token=` form pair; anything else is left alone.
    pub fn extract_from_body(&self, body: &str) {
        if body.is_empty() {
            return;
        }

        if body.starts_with('{') {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
                if let Some(token) = json.get(TOKEN_FIELD).and_then(serde_json::Value::as_str) {
                    self.set(token);
                }
            }
            return;
        }

        if let Some(token) = body
            .split('&')
            .find_map(|pair| pair.strip_prefix("_token="))
            .filter(|t| !t.is_empty())
        {
            self.set(token);
        }
    }

    /// Apply the token as both header aliases, overwriting caller values;
    /// the bridge is the single source of truth for session identity.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some(token) = self.get() {
            headers.insert(CSRF_HEADER, token.clone());
            headers.insert(XSRF_HEADER, token);
        }
    }
}
