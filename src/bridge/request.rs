//! Inbound request model, built fresh per intercepted surface request.

use super::response::HeaderMap;
use anyhow::{Context, Result};
use url::Url;

/// One request intercepted from the web surface, immutable once built.
///
/// Redirect handling clones it with a rewritten path and a cleared body via
/// [`BridgedRequest::redirect_to`].
#[derive(Debug, Clone)]
pub struct BridgedRequest {
    pub method: String,
    pub path: String,
    /// Ordered query pairs; order is preserved into the rebuilt query string.
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl BridgedRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            path: normalize_path(&path.into()),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// Build from a full surface URL, splitting the query into ordered pairs.
    pub fn from_url(method: &str, url: &str) -> Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("unparseable request URL: {url}"))?;
        let mut request = Self::new(method, parsed.path());
        request.query = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Ok(request)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Path plus rebuilt query string, as handed to the runtime.
    pub fn uri(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.query {
            serializer.append_pair(key, value);
        }
        format!("{}?{}", self.path, serializer.finish())
    }

    pub fn query_string(&self) -> String {
        self.uri()
            .split_once('?')
            .map(|(_, q)| q.to_owned())
            .unwrap_or_default()
    }

    /// POST/PUT/PATCH carry a body; everything else does not.
    pub fn is_bodied(&self) -> bool {
        matches!(self.method.as_str(), "POST" | "PUT" | "PATCH")
    }

    /// Fresh GET at the redirect target, body cleared, headers carried over.
    pub fn redirect_to(&self, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (
                p,
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect(),
            ),
            None => (target, Vec::new()),
        };
        Self {
            method: "GET".into(),
            path: normalize_path(path),
            query,
            headers: self.headers.clone(),
            body: None,
        }
    }
}

/// Collapse a doubled leading slash; the surface occasionally produces them.
fn normalize_path(path: &str) -> String {
    let path = if path.is_empty() { "/" } else { path };
    if path.starts_with("//") {
        path[1..].to_owned()
    } else {
        path.to_owned()
    }
}
