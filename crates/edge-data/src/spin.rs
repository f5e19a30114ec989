//! Upstream backed by Spin outbound HTTP.

use std::collections::HashMap;

use async_trait::async_trait;
use spin_sdk::http::{Method, Request, Response};

use crate::error::FetchError;
use crate::request::UpstreamRequest;
use crate::response::UpstreamResponse;
use crate::upstream::Upstream;

/// Outbound HTTP through the Spin host. The upstream host must be listed in
/// the component's `allowed_outbound_hosts`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinUpstream;

#[async_trait(?Send)]
impl Upstream for SpinUpstream {
    async fn fetch(&self, request: UpstreamRequest) -> Result<UpstreamResponse, FetchError> {
        let mut builder = Request::builder();
        builder.method(Method::Get).uri(&request.url);
        for (name, value) in &request.headers {
            builder.header(name.as_str(), value.as_str());
        }

        let resp: Response = spin_sdk::http::send(builder.build())
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        let status = *resp.status();
        let headers: HashMap<String, String> = resp
            .headers()
            .map(|(k, v)| (k.to_string(), v.as_str().unwrap_or("").to_string()))
            .collect();

        Ok(UpstreamResponse::new(status, headers, resp.into_body()))
    }
}
