//! Request context with typed parameters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::lifecycle::TimingContext;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{:x}-{:x}", nanos, seq))
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP headers, keyed by lowercase name.
pub type Headers = HashMap<String, String>;

/// HTTP method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    /// Any method without a dedicated variant (e.g. `TRACE`).
    Other(String),
}

impl Method {
    /// Parse a method token. Matching is case-insensitive.
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            other => Self::Other(other.to_string()),
        }
    }

    /// Canonical method token.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Other(token) => token,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed request context passed to route handlers.
#[derive(Debug)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Request path, without the query string.
    pub path: String,
    /// HTTP headers (lowercase names).
    pub headers: Headers,
    /// Raw request body.
    pub body: Vec<u8>,
    /// Per-request CSP nonce, set by the security middleware.
    pub nonce: Option<String>,
    /// Timing context for observability.
    pub timing: TimingContext,
}

impl RequestContext {
    /// Create a new request context from a method and a path that may carry a
    /// query string. The query string is dropped.
    pub fn new(method: Method, path_with_query: impl Into<String>) -> Self {
        let mut path = path_with_query.into();
        if let Some(start) = path.find('?') {
            path.truncate(start);
        }

        Self {
            request_id: RequestId::generate(),
            method,
            path,
            headers: HashMap::new(),
            body: Vec::new(),
            nonce: None,
            timing: TimingContext::new(),
        }
    }

    /// Add a header. Names are stored lowercase; a repeated header is joined
    /// with `, ` as HTTP allows for list-valued fields.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Insert a header in place.
    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        self.headers
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }
}
