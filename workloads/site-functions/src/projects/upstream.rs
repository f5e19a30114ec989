//! Repository listing fetcher.

use std::sync::Arc;

use serde_json::Value;

use edge_sdk::edge_data::{FetchError, Upstream, UpstreamRequest};

use super::repository::{normalize, SimplifiedRepository};
use crate::config::SiteConfig;

/// Media type that makes the listing include `topics`.
pub const TOPICS_MEDIA_TYPE: &str = "application/vnd.github.mercy-preview+json";

/// Result of a successful upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The stored validator is still current.
    NotModified,
    /// A new listing.
    Updated {
        repositories: Vec<SimplifiedRepository>,
        etag: Option<String>,
    },
}

/// Fetches and normalizes the repository listing.
#[derive(Clone)]
pub struct ProjectsFetcher {
    upstream: Arc<dyn Upstream>,
    url: String,
    user_agent: String,
    token: Option<String>,
}

impl ProjectsFetcher {
    /// Create a fetcher for `url`.
    pub fn new(upstream: Arc<dyn Upstream>, url: impl Into<String>) -> Self {
        Self {
            upstream,
            url: url.into(),
            user_agent: "site-functions".to_string(),
            token: None,
        }
    }

    /// Create a fetcher from site configuration.
    pub fn from_config(upstream: Arc<dyn Upstream>, config: &SiteConfig) -> Self {
        let fetcher = Self::new(upstream, &config.upstream_url).with_user_agent(&config.user_agent);
        match &config.github_token {
            Some(token) => fetcher.with_token(token),
            None => fetcher,
        }
    }

    /// Set the User-Agent.
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Authenticate with a bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Listing URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The request sent for a given stored validator.
    pub fn request(&self, etag: Option<&str>) -> UpstreamRequest {
        let request = UpstreamRequest::get(&self.url)
            .user_agent(&self.user_agent)
            .accept(TOPICS_MEDIA_TYPE)
            .if_none_match(etag);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Fetch the listing, conditionally when `etag` is given.
    ///
    /// `304` only counts as [`FetchOutcome::NotModified`] for a conditional
    /// request. Other non-2xx statuses and unparseable bodies are errors.
    pub async fn fetch(&self, etag: Option<&str>) -> Result<FetchOutcome, FetchError> {
        let response = self.upstream.fetch(self.request(etag)).await?;

        if response.is_not_modified() && etag.is_some() {
            return Ok(FetchOutcome::NotModified);
        }

        let response = response.error_for_status(&self.url)?;
        let payload: Value = response.json()?;

        Ok(FetchOutcome::Updated {
            repositories: normalize(&payload),
            etag: response.etag().map(str::to_string),
        })
    }
}
