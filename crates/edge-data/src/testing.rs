//! Scripted upstream for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::request::UpstreamRequest;
use crate::response::UpstreamResponse;
use crate::upstream::Upstream;

enum Scripted {
    Respond(UpstreamResponse),
    Fail(String),
}

/// Upstream that replays queued outcomes and records every request.
///
/// An exhausted script fails with a connection error.
#[derive(Default)]
pub struct ScriptedUpstream {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<UpstreamRequest>>,
    calls: AtomicUsize,
}

impl ScriptedUpstream {
    /// Create an upstream with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn respond(self, response: UpstreamResponse) -> Self {
        self.push(Scripted::Respond(response));
        self
    }

    /// Queue a `200` JSON response with an optional `ETag`.
    pub fn respond_json(self, body: &serde_json::Value, etag: Option<&str>) -> Self {
        let mut response = UpstreamResponse::new(200, Default::default(), body.to_string().into_bytes());
        if let Some(etag) = etag {
            response = response.with_header("ETag", etag);
        }
        self.respond(response)
    }

    /// Queue a bare status response.
    pub fn respond_status(self, status: u16) -> Self {
        self.respond(UpstreamResponse::new(status, Default::default(), Vec::new()))
    }

    /// Queue a transport failure.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(Scripted::Fail(message.into()));
        self
    }

    /// Number of requests sent.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests sent, oldest first.
    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn push(&self, item: Scripted) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(item);
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Upstream for ScriptedUpstream {
    async fn fetch(&self, request: UpstreamRequest) -> Result<UpstreamResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(FetchError::Connection(message)),
            None => Err(FetchError::Connection("script exhausted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_and_counts() {
        let upstream = ScriptedUpstream::new()
            .respond_json(&serde_json::json!([]), Some("\"e1\""))
            .respond_status(304)
            .fail("refused");

        let first = upstream.fetch(UpstreamRequest::get("u")).await.unwrap();
        assert_eq!(first.etag(), Some("\"e1\""));
        assert!(upstream.fetch(UpstreamRequest::get("u")).await.unwrap().is_not_modified());
        assert!(upstream.fetch(UpstreamRequest::get("u")).await.is_err());
        assert!(upstream.fetch(UpstreamRequest::get("u")).await.is_err());

        assert_eq!(upstream.calls(), 4);
        assert_eq!(upstream.requests().len(), 4);
    }
}
