//! Cache response headers and validators.

use serde::{Deserialize, Serialize};

/// Header names for cache debugging.
pub mod header_names {
    /// Cache status header (HIT, MISS, STALE).
    pub const X_CACHE_STATUS: &str = "X-Cache-Status";
    /// Most recent upstream modification carried by the cached body.
    pub const X_LAST_UPDATED: &str = "X-Last-Updated";
}

/// Status of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Fresh cache hit.
    Hit,
    /// Cache miss.
    Miss,
    /// Stale hit (serving while revalidating).
    Stale,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Stale => write!(f, "STALE"),
        }
    }
}

/// Builder for cache response headers.
#[derive(Debug, Default)]
pub struct CacheHeadersBuilder {
    etag: Option<String>,
    status: Option<CacheStatus>,
    last_updated: Option<String>,
}

impl CacheHeadersBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set ETag header from an unquoted tag.
    pub fn etag(mut self, value: impl Into<String>) -> Self {
        self.etag = Some(value.into());
        self
    }

    /// Set cache status.
    pub fn status(mut self, status: CacheStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set last-updated marker. Empty values are skipped.
    pub fn last_updated(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.last_updated = Some(value);
        }
        self
    }

    /// Build the headers.
    pub fn build(self) -> Vec<(String, String)> {
        let mut headers = Vec::new();

        if let Some(etag) = self.etag {
            headers.push(("ETag".to_string(), format!("\"{}\"", etag)));
        }

        if let Some(status) = self.status {
            headers.push((header_names::X_CACHE_STATUS.to_string(), status.to_string()));
        }

        if let Some(last_updated) = self.last_updated {
            headers.push((header_names::X_LAST_UPDATED.to_string(), last_updated));
        }

        headers
    }
}

/// Generate a simple ETag from content.
pub fn generate_etag(content: &[u8]) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Whether an `If-None-Match` value matches the unquoted `etag`.
///
/// Handles `*`, comma-separated lists and weak validators.
pub fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|candidate| {
        if candidate == "*" {
            return true;
        }
        let candidate = candidate.strip_prefix("W/").unwrap_or(candidate);
        candidate.trim_matches('"') == etag
    })
}
