//! Stale-while-revalidate cache over the repository listing.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use edge_sdk::edge_cache::{get_json, put_json, CacheStatus, EdgeStore, Freshness};
use edge_sdk::edge_core::Clock;
use edge_sdk::edge_executor::BackgroundExecutor;
use edge_sdk::edge_observability::StructuredLogger;

use super::repository::{last_updated, SimplifiedRepository};
use super::upstream::{FetchOutcome, ProjectsFetcher};

/// The single cached listing, stored as JSON under the upstream URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Serialized `SimplifiedRepository` array, served verbatim.
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub cached_at_ms: u64,
    #[serde(default)]
    pub last_updated_iso: String,
}

impl CacheEntry {
    /// Build an entry from a fresh listing.
    pub fn from_repositories(
        repositories: &[SimplifiedRepository],
        etag: Option<String>,
        cached_at_ms: u64,
    ) -> Self {
        Self {
            body: serde_json::to_string(repositories).unwrap_or_else(|_| "[]".to_string()),
            etag,
            cached_at_ms,
            last_updated_iso: last_updated(repositories),
        }
    }
}

/// A listing ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectsPayload {
    pub body: String,
    pub status: CacheStatus,
    pub last_updated_iso: String,
}

impl ProjectsPayload {
    fn from_entry(entry: CacheEntry, status: CacheStatus) -> Self {
        Self {
            body: entry.body,
            status,
            last_updated_iso: entry.last_updated_iso,
        }
    }

    /// The degraded answer when neither upstream nor cache has data.
    pub fn empty() -> Self {
        Self {
            body: "[]".to_string(),
            status: CacheStatus::Miss,
            last_updated_iso: String::new(),
        }
    }
}

/// What a background revalidation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revalidation {
    /// Upstream answered `304`; only the timestamp moved.
    NotModified,
    /// Upstream sent a new listing.
    Replaced,
    /// Upstream failed; the stale entry stays.
    Failed,
}

/// Cache manager for the projects listing.
///
/// Owns every read and write of the cache slot. Store failures are logged
/// and otherwise ignored: a failed read is a miss, a failed write loses only
/// the persistence.
#[derive(Clone)]
pub struct ProjectsCache {
    store: Arc<dyn EdgeStore>,
    fetcher: ProjectsFetcher,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ProjectsCache {
    /// Create a cache manager.
    pub fn new(
        store: Arc<dyn EdgeStore>,
        fetcher: ProjectsFetcher,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            fetcher,
            clock,
            ttl,
        }
    }

    /// Key of the cache slot.
    pub fn key(&self) -> &str {
        self.fetcher.url()
    }

    /// Serve the listing.
    ///
    /// Fresh entries are served as is. Stale entries are served immediately
    /// and a revalidation is submitted to `executor`; without one, the entry
    /// stays stale. An empty slot is filled synchronously.
    pub async fn serve(
        &self,
        logger: &StructuredLogger,
        executor: Option<&dyn BackgroundExecutor>,
    ) -> ProjectsPayload {
        let entry = self.load(logger).await;
        let freshness = Freshness::of_entry(
            entry.as_ref().map(|e| e.cached_at_ms),
            self.clock.now_ms(),
            self.ttl,
        );

        logger
            .debug_builder("Cache lookup")
            .field("freshness", format!("{:?}", freshness))
            .emit();

        match (freshness, entry) {
            (Freshness::Fresh, Some(entry)) => {
                ProjectsPayload::from_entry(entry, freshness.cache_status())
            }
            (Freshness::Stale, Some(entry)) => {
                match executor {
                    Some(executor) => {
                        let cache = self.clone();
                        let task_logger = logger.clone();
                        let stale = entry.clone();
                        executor.submit(
                            "projects-revalidate",
                            Box::pin(async move {
                                cache.revalidate(stale, &task_logger).await;
                            }),
                        );
                    }
                    None => logger.debug("No background executor, revalidation skipped"),
                }
                ProjectsPayload::from_entry(entry, freshness.cache_status())
            }
            _ => self.refresh(None, logger).await,
        }
    }

    /// Fetch the listing unconditionally and store it.
    ///
    /// On upstream failure serves `fallback`, else whatever the store holds,
    /// regardless of age; with nothing cached at all, an empty list.
    pub async fn refresh(
        &self,
        fallback: Option<CacheEntry>,
        logger: &StructuredLogger,
    ) -> ProjectsPayload {
        match self.fetcher.fetch(None).await {
            Ok(FetchOutcome::Updated { repositories, etag }) => {
                let entry =
                    CacheEntry::from_repositories(&repositories, etag, self.clock.now_ms());
                logger
                    .info_builder("Fetched repository listing")
                    .field_i64("repositories", repositories.len() as i64)
                    .emit();
                self.save(&entry, logger).await;
                ProjectsPayload::from_entry(entry, CacheStatus::Miss)
            }
            Ok(FetchOutcome::NotModified) => {
                self.serve_fallback(fallback, "unexpected not-modified", logger)
                    .await
            }
            Err(e) => self.serve_fallback(fallback, &e.to_string(), logger).await,
        }
    }

    /// Revalidate a stale entry against upstream.
    pub async fn revalidate(&self, stale: CacheEntry, logger: &StructuredLogger) -> Revalidation {
        match self.fetcher.fetch(stale.etag.as_deref()).await {
            Ok(FetchOutcome::NotModified) => {
                let entry = CacheEntry {
                    cached_at_ms: self.clock.now_ms(),
                    ..stale
                };
                self.save(&entry, logger).await;
                logger.info("Revalidated listing, not modified");
                Revalidation::NotModified
            }
            Ok(FetchOutcome::Updated { repositories, etag }) => {
                let entry =
                    CacheEntry::from_repositories(&repositories, etag, self.clock.now_ms());
                self.save(&entry, logger).await;
                logger
                    .info_builder("Revalidated listing, replaced")
                    .field_i64("repositories", repositories.len() as i64)
                    .emit();
                Revalidation::Replaced
            }
            Err(e) => {
                logger
                    .warn_builder("Revalidation failed, keeping stale entry")
                    .field("error", e.to_string())
                    .emit();
                Revalidation::Failed
            }
        }
    }

    /// Read the cache slot. Failures read as empty.
    pub async fn load(&self, logger: &StructuredLogger) -> Option<CacheEntry> {
        match get_json::<CacheEntry>(self.store.as_ref(), self.key()).await {
            Ok(entry) => entry,
            Err(e) => {
                logger
                    .warn_builder("Cache read failed")
                    .field("error", e.to_string())
                    .emit();
                None
            }
        }
    }

    async fn save(&self, entry: &CacheEntry, logger: &StructuredLogger) {
        if let Err(e) = put_json(self.store.as_ref(), self.key(), entry).await {
            logger
                .warn_builder("Cache write failed")
                .field("error", e.to_string())
                .emit();
        }
    }

    async fn serve_fallback(
        &self,
        fallback: Option<CacheEntry>,
        reason: &str,
        logger: &StructuredLogger,
    ) -> ProjectsPayload {
        let cached = match fallback {
            Some(entry) => Some(entry),
            None => self.load(logger).await,
        };

        logger
            .warn_builder("Upstream unavailable")
            .field("error", reason)
            .field_bool("served_cached", cached.is_some())
            .emit();

        match cached {
            Some(entry) => ProjectsPayload::from_entry(entry, CacheStatus::Stale),
            None => ProjectsPayload::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_sdk::edge_cache::InMemoryStore;
    use edge_sdk::edge_core::{ManualClock, RequestId};
    use edge_sdk::edge_data::ScriptedUpstream;
    use edge_sdk::edge_executor::DeferredTasks;
    use serde_json::json;

    const URL: &str = "https://api.github.com/users/x/repos";
    const TTL: Duration = Duration::from_secs(900);

    struct Harness {
        cache: ProjectsCache,
        store: Arc<InMemoryStore>,
        upstream: Arc<ScriptedUpstream>,
        clock: Arc<ManualClock>,
        logger: StructuredLogger,
    }

    fn harness(upstream: ScriptedUpstream) -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let upstream = Arc::new(upstream);
        let clock = Arc::new(ManualClock::new(1_000_000));
        let cache = ProjectsCache::new(
            store.clone(),
            ProjectsFetcher::new(upstream.clone(), URL),
            clock.clone(),
            TTL,
        );
        Harness {
            cache,
            store,
            upstream,
            clock,
            logger: StructuredLogger::new(RequestId::from_string("test"))
                .with_capture(Default::default()),
        }
    }

    fn listing(name: &str, updated: &str) -> serde_json::Value {
        json!([{"name": name, "html_url": format!("https://github.com/x/{name}"), "updated_at": updated}])
    }

    async fn stored(h: &Harness) -> Option<CacheEntry> {
        get_json(h.store.as_ref(), URL).await.unwrap()
    }

    #[tokio::test]
    async fn test_miss_fetches_and_stores() {
        let h = harness(
            ScriptedUpstream::new().respond_json(&listing("a", "2024-02-02T00:00:00Z"), Some("\"v1\"")),
        );

        let payload = h.cache.serve(&h.logger, None).await;

        assert_eq!(payload.status, CacheStatus::Miss);
        assert_eq!(payload.last_updated_iso, "2024-02-02T00:00:00Z");
        let entry = stored(&h).await.unwrap();
        assert_eq!(entry.body, payload.body);
        assert_eq!(entry.etag.as_deref(), Some("\"v1\""));
        assert_eq!(entry.cached_at_ms, 1_000_000);
    }

    #[tokio::test]
    async fn test_fresh_hit_skips_upstream() {
        let h = harness(ScriptedUpstream::new().respond_json(&listing("a", ""), None));

        let first = h.cache.serve(&h.logger, None).await;
        h.clock.advance(Duration::from_secs(899));
        let second = h.cache.serve(&h.logger, None).await;

        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(first.body, second.body);
        assert_eq!(h.upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_stale_serves_then_revalidates_after_response() {
        let h = harness(
            ScriptedUpstream::new()
                .respond_json(&listing("a", "2024-01-01T00:00:00Z"), Some("\"v1\""))
                .respond_json(&listing("b", "2024-06-01T00:00:00Z"), Some("\"v2\"")),
        );
        let deferred = DeferredTasks::new();

        let first = h.cache.serve(&h.logger, Some(&deferred)).await;
        h.clock.advance(TTL);
        let stale = h.cache.serve(&h.logger, Some(&deferred)).await;

        assert_eq!(stale.status, CacheStatus::Stale);
        assert_eq!(stale.body, first.body);
        assert_eq!(h.upstream.calls(), 1);
        assert_eq!(deferred.len(), 1);

        deferred.run_all().await;

        assert_eq!(h.upstream.calls(), 2);
        assert_eq!(
            h.upstream.requests()[1].header_value("If-None-Match"),
            Some("\"v1\"")
        );
        let entry = stored(&h).await.unwrap();
        assert!(entry.body.contains("\"b\""));
        assert_eq!(entry.etag.as_deref(), Some("\"v2\""));
        assert_eq!(entry.last_updated_iso, "2024-06-01T00:00:00Z");

        let next = h.cache.serve(&h.logger, None).await;
        assert_eq!(next.status, CacheStatus::Hit);
    }

    #[tokio::test]
    async fn test_stale_without_executor_skips_revalidation() {
        let h = harness(ScriptedUpstream::new().respond_json(&listing("a", ""), None));
        h.cache.serve(&h.logger, None).await;
        h.clock.advance(TTL * 2);

        let payload = h.cache.serve(&h.logger, None).await;

        assert_eq!(payload.status, CacheStatus::Stale);
        assert_eq!(h.upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_not_modified_bumps_timestamp_only() {
        let h = harness(ScriptedUpstream::new().respond_status(304));
        let stale = CacheEntry {
            body: r#"[{"name":"a"}]"#.to_string(),
            etag: Some("\"v1\"".to_string()),
            cached_at_ms: 5,
            last_updated_iso: "2024-01-01T00:00:00Z".to_string(),
        };

        let outcome = h.cache.revalidate(stale.clone(), &h.logger).await;

        assert_eq!(outcome, Revalidation::NotModified);
        assert_eq!(
            stored(&h).await.unwrap(),
            CacheEntry {
                cached_at_ms: 1_000_000,
                ..stale
            }
        );
    }

    #[tokio::test]
    async fn test_failed_revalidation_leaves_entry() {
        let h = harness(ScriptedUpstream::new().respond_status(500).fail("refused"));
        let stale = CacheEntry::from_repositories(&[], Some("\"v1\"".into()), 5);
        put_json(h.store.as_ref(), URL, &stale).await.unwrap();

        assert_eq!(h.cache.revalidate(stale.clone(), &h.logger).await, Revalidation::Failed);
        assert_eq!(h.cache.revalidate(stale.clone(), &h.logger).await, Revalidation::Failed);
        assert_eq!(stored(&h).await.unwrap(), stale);
    }

    #[tokio::test]
    async fn test_refresh_failure_without_cache_is_empty() {
        let h = harness(ScriptedUpstream::new().fail("connection refused"));

        let payload = h.cache.serve(&h.logger, None).await;

        assert_eq!(payload, ProjectsPayload::empty());
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_failure_serves_fallback() {
        let h = harness(ScriptedUpstream::new().respond_status(502).respond_status(502));
        let old = CacheEntry::from_repositories(&[], None, 1);

        let payload = h.cache.refresh(Some(old.clone()), &h.logger).await;
        assert_eq!(payload.status, CacheStatus::Stale);
        assert_eq!(payload.body, old.body);

        put_json(h.store.as_ref(), URL, &old).await.unwrap();
        let payload = h.cache.refresh(None, &h.logger).await;
        assert_eq!(payload.body, old.body);
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_as_miss() {
        let h = harness(ScriptedUpstream::new().respond_json(&listing("a", ""), None));
        h.store.put(URL, b"{not json").await.unwrap();

        let payload = h.cache.serve(&h.logger, None).await;

        assert_eq!(payload.status, CacheStatus::Miss);
        assert!(stored(&h).await.is_some());
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = CacheEntry {
            body: "[]".into(),
            etag: None,
            cached_at_ms: 7,
            last_updated_iso: String::new(),
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"body": "[]", "cachedAtMs": 7, "lastUpdatedIso": ""})
        );
    }
}
