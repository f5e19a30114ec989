//! Upstream HTTP capability.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::request::UpstreamRequest;
use crate::response::UpstreamResponse;

/// Sends outbound requests.
///
/// Any status code is returned as a response; only transport failures are
/// errors.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Upstream: Send + Sync {
    /// Send `request` and buffer the response.
    async fn fetch(&self, request: UpstreamRequest) -> Result<UpstreamResponse, FetchError>;
}
