//! Site configuration.
//!
//! Loaded from TOML for local runs and from Spin application variables when
//! deployed. Every field has a default, so an empty source is valid.

use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use edge_sdk::edge_cache::RouteCachePolicy;
use edge_sdk::edge_core::RequestId;
use edge_sdk::edge_observability::{LogFormat, LogLevel, StructuredLogger};
use edge_sdk::edge_security::{RateLimitConfig, DEFAULT_CLIENT_IP_HEADER};

use crate::WORKLOAD_NAME;

/// Runtime configuration for the site's edge functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Origin the site is served from; other browser origins are refused.
    pub site_origin: String,
    /// Repository listing URL. Also the cache key.
    pub upstream_url: String,
    /// User-Agent sent upstream.
    pub user_agent: String,
    /// Optional API token, sent as a bearer token.
    pub github_token: Option<String>,
    /// Age at which the cached listing turns stale.
    pub cache_ttl_secs: u64,
    /// `max-age` for browsers.
    pub browser_max_age_secs: u64,
    /// `s-maxage` for shared caches.
    pub edge_max_age_secs: u64,
    pub rate_limit_window_ms: u64,
    pub rate_limit_max: u32,
    /// Header a trusted proxy sets to the client address.
    pub client_ip_header: String,
    pub log_format: LogFormat,
    pub log_level: LogLevel,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_origin: "https://no-tone.com".to_string(),
            upstream_url: "https://api.github.com/users/no-tone/repos?per_page=100&sort=updated"
                .to_string(),
            user_agent: "no-tone-site-functions".to_string(),
            github_token: None,
            cache_ttl_secs: 900,
            browser_max_age_secs: 300,
            edge_max_age_secs: 900,
            rate_limit_window_ms: 60_000,
            rate_limit_max: 90,
            client_ip_header: DEFAULT_CLIENT_IP_HEADER.to_string(),
            log_format: LogFormat::Json,
            log_level: LogLevel::Info,
        }
    }
}

impl SiteConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).context("Failed to parse site config")?;
        config.validate()?;
        Ok(config)
    }

    /// Build from a name-to-value lookup (Spin variables when deployed).
    /// Missing and empty values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("site_origin") {
            config.site_origin = v;
        }
        if let Some(v) = get("upstream_url") {
            config.upstream_url = v;
        }
        if let Some(v) = get("user_agent") {
            config.user_agent = v;
        }
        config.github_token = get("github_token");
        if let Some(v) = get("cache_ttl_secs") {
            config.cache_ttl_secs = parse_number("cache_ttl_secs", &v)?;
        }
        if let Some(v) = get("browser_max_age_secs") {
            config.browser_max_age_secs = parse_number("browser_max_age_secs", &v)?;
        }
        if let Some(v) = get("edge_max_age_secs") {
            config.edge_max_age_secs = parse_number("edge_max_age_secs", &v)?;
        }
        if let Some(v) = get("rate_limit_window_ms") {
            config.rate_limit_window_ms = parse_number("rate_limit_window_ms", &v)?;
        }
        if let Some(v) = get("rate_limit_max") {
            config.rate_limit_max = parse_number("rate_limit_max", &v)?;
        }
        if let Some(v) = get("client_ip_header") {
            config.client_ip_header = v.trim().to_ascii_lowercase();
        }
        if let Some(v) = get("log_format") {
            config.log_format = LogFormat::parse(&v)
                .with_context(|| format!("Invalid log_format: {}", v))?;
        }
        if let Some(v) = get("log_level") {
            config.log_level =
                LogLevel::parse(&v).with_context(|| format!("Invalid log_level: {}", v))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the handlers cannot work with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            is_http_url(&self.site_origin),
            "site_origin must be an http(s) origin, got {:?}",
            self.site_origin
        );
        ensure!(
            is_http_url(&self.upstream_url),
            "upstream_url must be an http(s) URL, got {:?}",
            self.upstream_url
        );
        ensure!(!self.user_agent.trim().is_empty(), "user_agent must not be empty");
        ensure!(self.cache_ttl_secs > 0, "cache_ttl_secs must be positive");
        ensure!(self.rate_limit_window_ms > 0, "rate_limit_window_ms must be positive");
        ensure!(self.rate_limit_max > 0, "rate_limit_max must be positive");
        ensure!(
            !self.client_ip_header.trim().is_empty(),
            "client_ip_header must not be empty"
        );
        Ok(())
    }

    /// Freshness window of the cached listing.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// `Cache-Control` policy for the projects route.
    pub fn projects_cache_policy(&self) -> RouteCachePolicy {
        RouteCachePolicy::public(Duration::from_secs(self.browser_max_age_secs))
            .with_shared_ttl(Duration::from_secs(self.edge_max_age_secs))
    }

    /// Rate limiter configuration.
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::new(
            Duration::from_millis(self.rate_limit_window_ms),
            self.rate_limit_max,
        )
    }

    /// Logger for one request.
    pub fn logger(&self, request_id: &RequestId) -> StructuredLogger {
        StructuredLogger::new(request_id.clone())
            .with_workload(WORKLOAD_NAME)
            .with_min_level(self.log_level)
            .with_format(self.log_format)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {}: {:?}", name, value))
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty())
}
