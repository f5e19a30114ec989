//! Buffered HTTP response produced by route handlers.

use http::StatusCode;
use serde::Serialize;

/// JSON content type used by every API route.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A fully buffered response.
///
/// Header names keep the casing they were set with; lookups are
/// case-insensitive and setting a header replaces any previous value.
#[derive(Debug, Clone)]
pub struct EdgeResponse {
    /// HTTP status.
    pub status: StatusCode,
    headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl EdgeResponse {
    /// Create an empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Create a JSON response.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"null".to_vec());
        Self::new(status)
            .with_header("Content-Type", JSON_CONTENT_TYPE)
            .with_body(body)
    }

    /// Create a JSON response from an already serialized body.
    pub fn raw_json(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status)
            .with_header("Content-Type", JSON_CONTENT_TYPE)
            .with_body(body)
    }

    /// Set a header, replacing any existing value.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Set several headers.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.set_header(name.as_ref(), value);
        }
        self
    }

    /// Replace the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header in place, replacing any existing value.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    /// Set a header only when the response does not carry it yet.
    pub fn set_header_if_absent(&mut self, name: &str, value: impl Into<String>) {
        if self.header(name).is_none() {
            self.headers.push((name.to_string(), value.into()));
        }
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Body as text (lossy).
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Whether the response carries an HTML document.
    pub fn is_html(&self) -> bool {
        self.header("Content-Type")
            .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/html"))
            .unwrap_or(false)
    }
}
