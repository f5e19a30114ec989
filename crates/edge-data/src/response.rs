//! Upstream HTTP response handling.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::error::FetchError;

/// A buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The response headers.
    pub headers: HashMap<String, String>,
    /// The response body.
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    /// Create a new response.
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Add a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the upstream reported the cached copy as current (304).
    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Get a header value.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// The `ETag` validator, if the upstream sent a non-empty one.
    pub fn etag(&self) -> Option<&str> {
        self.header("ETag").filter(|v| !v.trim().is_empty())
    }

    /// Convert to a Result, returning an error for non-2xx status codes.
    pub fn error_for_status(self, url: &str) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Http {
                status: self.status,
                url: url.to_string(),
            })
        }
    }
}
