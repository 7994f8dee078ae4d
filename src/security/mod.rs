pub mod cookies;
pub mod csrf;

pub use cookies::{CookieJar, CookieMirror, NoopMirror};
pub use csrf::{CSRF_HEADER, CsrfGuard, XSRF_HEADER};
