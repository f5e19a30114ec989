//! Route-level cache policies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cache scope determining who can cache the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    /// Cacheable by CDN and browser (shared cache).
    Public,
    /// No caching.
    #[default]
    None,
}

impl CacheScope {
    /// Get the Cache-Control directive for this scope.
    pub fn cache_control_directive(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::None => "no-store",
        }
    }
}

/// Route-level cache policy, rendered into a `Cache-Control` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCachePolicy {
    /// Cache scope.
    pub scope: CacheScope,
    /// Browser max-age.
    pub ttl: Duration,
    /// Shared cache (CDN) max-age, rendered as `s-maxage`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_ttl: Option<Duration>,
}

impl Default for RouteCachePolicy {
    fn default() -> Self {
        Self::no_store()
    }
}

impl RouteCachePolicy {
    /// Policy that forbids caching.
    pub fn no_store() -> Self {
        Self {
            scope: CacheScope::None,
            ttl: Duration::ZERO,
            shared_ttl: None,
        }
    }

    /// Create a public cache policy.
    pub fn public(ttl: Duration) -> Self {
        Self {
            scope: CacheScope::Public,
            ttl,
            ..Self::no_store()
        }
    }

    /// Set the shared cache max-age. Ignored when caching is off.
    pub fn with_shared_ttl(mut self, ttl: Duration) -> Self {
        self.shared_ttl = Some(ttl);
        self
    }

    /// Generate Cache-Control header value.
    pub fn cache_control_header(&self) -> String {
        if self.scope == CacheScope::None {
            return "no-store".to_string();
        }

        let mut parts = vec![self.scope.cache_control_directive().to_string()];

        parts.push(format!("max-age={}", self.ttl.as_secs()));

        if let Some(shared) = self.shared_ttl {
            parts.push(format!("s-maxage={}", shared.as_secs()));
        }

        parts.join(", ")
    }
}
