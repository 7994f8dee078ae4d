//! Response-side types shared by the decoder and the bridge.

/// Ordered, case-insensitive header map.
///
/// `insert` replaces every existing value for the name; `append` adds one
/// more. `Set-Cookie` must always go through `append` so that no occurrence
/// is lost; the decoder enforces this.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.entries.push((name, value.into()));
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for the name, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for the name, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decoded runtime response: status, headers, raw body bytes.
#[derive(Debug, Clone)]
pub struct BridgedResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl BridgedResponse {
    pub fn new(status: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn content_type(&self) -> &str {
        self.headers.get("Content-Type").unwrap_or("text/html")
    }

    /// Every `Set-Cookie` occurrence, preserved distinctly.
    pub fn set_cookies(&self) -> Vec<&str> {
        self.headers.get_all("Set-Cookie")
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get("Location")
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Synthetic HTML error page routed through the normal response path
    /// instead of a native crash dialog.
    pub fn error_page(status: u16, message: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", "text/html");
        Self {
            status,
            headers,
            body: format!("<html><body><h1>{status} - {message}</h1></body></html>").into_bytes(),
        }
    }

    pub fn too_many_redirects() -> Self {
        Self::error_page(500, "Too many redirects")
    }
}
