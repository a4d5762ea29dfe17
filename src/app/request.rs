//! Request data handed to the dispatcher.

use axum::http::{Method, Uri};

/// Method, path, host and decoded query pairs of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
    pub host: Option<String>,
    pub query: Vec<(String, String)>,
}

impl RequestInfo {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            host: None,
            query: Vec::new(),
        }
    }

    /// Build from a request URI, decoding its query string.
    pub fn from_uri(method: Method, uri: &Uri) -> Self {
        let mut info = Self::new(method, uri.path());
        if let Some(query) = uri.query() {
            info = info.with_query(query);
        }
        if let Some(authority) = uri.authority() {
            info.host = Some(authority.to_string());
        }
        info
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Decode `query` (without the leading `?`) and append its pairs.
    pub fn with_query(mut self, query: &str) -> Self {
        self.query
            .extend(url::form_urlencoded::parse(query.as_bytes()).into_owned());
        self
    }

    /// First query value for `name`.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}
