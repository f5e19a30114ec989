//! Client-facing errors.

use serde_json::json;

use edge_sdk::edge_core::{EdgeResponse, StatusCode};
use edge_sdk::edge_security::RETRY_AFTER;

/// Request rejections surfaced to the caller as 4xx JSON bodies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Forbidden")]
    Forbidden,

    #[error("Method Not Allowed")]
    MethodNotAllowed { allow: String },

    #[error("Too Many Requests")]
    RateLimited { retry_after_secs: u64 },

    #[error("Not Found")]
    NotFound,
}

impl ClientError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// `{"error": "..."}` response, with `Allow` or `Retry-After` where
    /// the status calls for it.
    pub fn into_response(self) -> EdgeResponse {
        let response = EdgeResponse::json(self.status(), &json!({ "error": self.to_string() }));
        match self {
            Self::MethodNotAllowed { allow } => response.with_header("Allow", allow),
            Self::RateLimited { retry_after_secs } => {
                response.with_header(RETRY_AFTER, retry_after_secs.to_string())
            }
            Self::Forbidden | Self::NotFound => response,
        }
    }
}
