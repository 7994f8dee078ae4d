//! Request Bridge: one intercepted surface request in, one decoded response
//! out.
//!
//! The bridge synthesizes the runtime's per-call environment, invokes the
//! runtime exactly once per cycle on the dedicated worker, decodes the raw
//! output, folds `Set-Cookie` headers into the jar and the surface's native
//! store, and follows same-origin redirects up to a bound.

pub mod decode;
pub mod request;
pub mod response;
pub mod worker;

pub use decode::{CSRF_ERROR_HEADER, CSRF_MISMATCH_STATUS, decode};
pub use request::BridgedRequest;
pub use response::{BridgedResponse, HeaderMap};
pub use worker::RuntimeWorker;

use crate::config::HostConfig;
use crate::error::BridgeError;
use crate::runtime::{Invocation, RuntimeEnv};
use crate::security::{CookieJar, CookieMirror, CsrfGuard};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Redirect chains are capped instead of cancelled; hop 11 fails.
pub const MAX_REDIRECTS: u32 = 10;

pub struct RequestBridge {
    worker: RuntimeWorker,
    env: RuntimeEnv,
    jar: Arc<CookieJar>,
    csrf: Arc<CsrfGuard>,
    mirror: Arc<dyn CookieMirror>,
    origin: String,
    origin_host: Option<String>,
    entry_script: PathBuf,
}

impl RequestBridge {
    pub fn new(
        config: &HostConfig,
        worker: RuntimeWorker,
        env: RuntimeEnv,
        jar: Arc<CookieJar>,
        csrf: Arc<CsrfGuard>,
        mirror: Arc<dyn CookieMirror>,
    ) -> Self {
        Self {
            worker,
            env,
            jar,
            csrf,
            mirror,
            origin: config.origin.clone(),
            origin_host: config.origin_host(),
            entry_script: config.entry_script_path(),
        }
    }

    /// Run one request/response cycle, following same-origin redirects.
    ///
    /// Never panics and never returns an error: runtime failures come back
    /// as an HTML error page routed through the normal response path.
    pub async fn handle(&self, request: BridgedRequest) -> BridgedResponse {
        let mut request = request;
        let mut hops: u32 = 0;

        loop {
            let response = match self.dispatch_once(&request).await {
                Ok(response) => response,
                Err(error) => {
                    tracing::warn!(%error, method = %request.method, path = %request.path,
                        "runtime invocation failed");
                    return BridgedResponse::error_page(500, "Internal runtime error");
                }
            };

            self.absorb_cookies(&response);

            if response.is_redirect() {
                if let Some(location) = response.location() {
                    match resolve_redirect(self.origin_host.as_deref(), location) {
                        RedirectTarget::SameOrigin(target) => {
                            hops += 1;
                            if hops > MAX_REDIRECTS {
                                tracing::warn!(location, "redirect cap hit");
                                return BridgedResponse::too_many_redirects();
                            }
                            tracing::debug!("following redirect {hops}/{MAX_REDIRECTS} to {target}");
                            request = request.redirect_to(&target);
                            continue;
                        }
                        // External locations are handed to the surface
                        // untouched rather than replayed against the runtime.
                        RedirectTarget::External => return response,
                    }
                }
            }

            return response;
        }
    }

    /// One runtime invocation: finalize identity headers, build the CGI-like
    /// environment, submit to the worker, decode.
    async fn dispatch_once(
        &self,
        request: &BridgedRequest,
    ) -> std::result::Result<BridgedResponse, BridgeError> {
        let mut request = request.clone();

        if let Some(body) = request.body.as_deref() {
            if request.is_bodied() {
                self.csrf.extract_from_body(body);
            }
        }

        // The bridge is the single source of truth for session identity:
        // jar and token overwrite whatever the surface supplied.
        request.headers.insert("Cookie", self.jar.header_value());
        self.csrf.apply(&mut request.headers);

        let body = if request.is_bodied() {
            request.body.clone()
        } else {
            None
        };

        let call = Invocation {
            method: request.method.clone(),
            uri: request.uri(),
            body,
            script: self.entry_script.clone(),
            env: self.env.for_request(&request),
        };

        let raw = self.worker.invoke(call).await?;
        Ok(decode(&raw))
    }

    fn absorb_cookies(&self, response: &BridgedResponse) {
        let cookies = response.set_cookies();
        if cookies.is_empty() {
            return;
        }
        for raw in &cookies {
            self.jar.store_from_set_cookie(raw);
            self.mirror.set_cookie(&self.origin, raw);
        }
        self.mirror.flush();
    }
}

enum RedirectTarget {
    SameOrigin(String),
    External,
}

/// Resolve a `Location` value against the fixed local origin.
///
/// Relative locations are same-origin by construction. Absolute ones are
/// same-origin only when their host is the configured origin host or a local
/// loopback name; everything else belongs to the surface.
fn resolve_redirect(origin_host: Option<&str>, location: &str) -> RedirectTarget {
    if location.starts_with('/') {
        return RedirectTarget::SameOrigin(location.to_owned());
    }

    if location.starts_with("http://") || location.starts_with("https://") {
        let Ok(url) = Url::parse(location) else {
            return RedirectTarget::External;
        };
        let host = url.host_str().unwrap_or_default();
        let local = matches!(host, "127.0.0.1" | "localhost")
            || origin_host.is_some_and(|origin| origin.eq_ignore_ascii_case(host));
        if !local {
            return RedirectTarget::External;
        }
        let target = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_owned(),
        };
        return RedirectTarget::SameOrigin(target);
    }

    // Bare path without a leading slash.
    RedirectTarget::SameOrigin(format!("/{location}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same_origin(location: &str) -> Option<String> {
        match resolve_redirect(Some("127.0.0.1"), location) {
            RedirectTarget::SameOrigin(path) => Some(path),
            RedirectTarget::External => None,
        }
    }

    #[test]
    fn relative_location_is_same_origin() {
        assert_eq!(same_origin("/dashboard").as_deref(), Some("/dashboard"));
    }

    #[test]
    fn absolute_local_location_is_replayed_as_path() {
        assert_eq!(
            same_origin("http://127.0.0.1/home?tab=1").as_deref(),
            Some("/home?tab=1")
        );
        assert_eq!(same_origin("http://localhost/home").as_deref(), Some("/home"));
    }

    #[test]
    fn absolute_external_location_is_handed_to_the_surface() {
        assert!(same_origin("https://example.com/login").is_none());
    }

    #[test]
    fn bare_location_gets_a_leading_slash() {
        assert_eq!(same_origin("profile").as_deref(), Some("/profile"));
    }
}
