//! Freshness classification for cached entries.

use std::time::Duration;

use crate::headers::CacheStatus;

/// Where a cache slot sits relative to its TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No entry.
    Empty,
    /// Entry younger than the TTL.
    Fresh,
    /// Entry at or past the TTL.
    Stale,
}

impl Freshness {
    /// Classify an entry by its age. `None` means there is no entry.
    pub fn classify(age: Option<Duration>, ttl: Duration) -> Self {
        match age {
            None => Self::Empty,
            Some(age) if age < ttl => Self::Fresh,
            Some(_) => Self::Stale,
        }
    }

    /// Classify an entry written at `cached_at_ms`.
    ///
    /// An entry stamped in the future counts as age zero.
    pub fn of_entry(cached_at_ms: Option<u64>, now_ms: u64, ttl: Duration) -> Self {
        Self::classify(
            cached_at_ms.map(|at| Duration::from_millis(now_ms.saturating_sub(at))),
            ttl,
        )
    }

    /// The status reported to clients for a response served in this state.
    pub fn cache_status(&self) -> CacheStatus {
        match self {
            Self::Empty => CacheStatus::Miss,
            Self::Fresh => CacheStatus::Hit,
            Self::Stale => CacheStatus::Stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(900);

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(Freshness::classify(None, TTL), Freshness::Empty);
        assert_eq!(Freshness::classify(Some(Duration::ZERO), TTL), Freshness::Fresh);
        assert_eq!(
            Freshness::classify(Some(Duration::from_millis(899_999)), TTL),
            Freshness::Fresh
        );
        assert_eq!(Freshness::classify(Some(TTL), TTL), Freshness::Stale);
    }

    #[test]
    fn test_future_entry_is_fresh() {
        assert_eq!(Freshness::of_entry(Some(5_000), 1_000, TTL), Freshness::Fresh);
    }

    #[test]
    fn test_cache_status_mapping() {
        assert_eq!(Freshness::Empty.cache_status(), CacheStatus::Miss);
        assert_eq!(Freshness::Fresh.cache_status(), CacheStatus::Hit);
        assert_eq!(Freshness::Stale.cache_status(), CacheStatus::Stale);
    }
}
