//! Upstream fetch error types.

/// Errors from an upstream call.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or the connection failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The upstream answered with a status the caller does not accept.
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}
