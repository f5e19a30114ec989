//! Fixed-window rate limiting keyed by client identity.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const X_RATELIMIT_LIMIT: &str = "X-RateLimit-Limit";
pub const X_RATELIMIT_REMAINING: &str = "X-RateLimit-Remaining";
/// Window end, epoch seconds.
pub const X_RATELIMIT_RESET: &str = "X-RateLimit-Reset";
pub const RETRY_AFTER: &str = "Retry-After";

/// Fixed-window configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length.
    pub window: Duration,
    /// Requests allowed per window.
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(60_000),
            max_requests: 90,
        }
    }
}

impl RateLimitConfig {
    /// Create a configuration.
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
        }
    }
}

/// Stored counter for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitEntry {
    /// Requests seen in the current window.
    pub count: u32,
    /// Epoch milliseconds at which the window ends.
    pub window_reset_at_ms: u64,
}

/// Result of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitState {
    pub limit: u32,
    pub remaining: u32,
    /// Epoch milliseconds at which the window ends.
    pub reset_at_ms: u64,
    pub blocked: bool,
}

impl RateLimitState {
    /// Window end in epoch seconds, rounded up.
    pub fn reset_epoch_secs(&self) -> u64 {
        self.reset_at_ms.div_ceil(1000)
    }

    /// Seconds a blocked client should wait, at least 1.
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        self.reset_at_ms.saturating_sub(now_ms).div_ceil(1000).max(1)
    }

    /// `X-RateLimit-*` headers describing this state.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            (
                X_RATELIMIT_LIMIT.to_string(),
                self.limit.to_string(),
            ),
            (
                X_RATELIMIT_REMAINING.to_string(),
                self.remaining.to_string(),
            ),
            (
                X_RATELIMIT_RESET.to_string(),
                self.reset_epoch_secs().to_string(),
            ),
        ]
    }
}

/// Rate limiter capability.
pub trait RateLimiter: Send + Sync {
    /// Count one request from `client_id` at `now_ms` and report the outcome.
    fn check(&self, client_id: &str, now_ms: u64) -> RateLimitState;
}

/// Backing storage for window counters.
///
/// Implementations swallow their own failures: a failed load reads as no
/// entry, a failed save is dropped.
pub trait WindowStore: Send + Sync {
    /// Load the entry for a client.
    fn load(&self, client_id: &str) -> Option<RateLimitEntry>;

    /// Persist the entry for a client.
    fn save(&self, client_id: &str, entry: RateLimitEntry, now_ms: u64);
}

/// Apply one request to a previous entry.
pub fn advance_window(
    previous: Option<RateLimitEntry>,
    now_ms: u64,
    config: &RateLimitConfig,
) -> (RateLimitEntry, RateLimitState) {
    let limit = config.max_requests;

    let entry = match previous {
        Some(entry) if now_ms < entry.window_reset_at_ms => RateLimitEntry {
            count: entry.count.saturating_add(1),
            window_reset_at_ms: entry.window_reset_at_ms,
        },
        _ => RateLimitEntry {
            count: 1,
            window_reset_at_ms: now_ms.saturating_add(config.window.as_millis() as u64),
        },
    };

    let blocked = entry.count > limit;
    let state = RateLimitState {
        limit,
        remaining: if blocked { 0 } else { limit - entry.count },
        reset_at_ms: entry.window_reset_at_ms,
        blocked,
    };

    (entry, state)
}

/// Fixed-window limiter over a [`WindowStore`].
#[derive(Debug)]
pub struct FixedWindowLimiter<S> {
    config: RateLimitConfig,
    store: S,
}

impl<S: WindowStore> FixedWindowLimiter<S> {
    /// Create a limiter.
    pub fn new(config: RateLimitConfig, store: S) -> Self {
        Self { config, store }
    }

    /// The active configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: WindowStore> RateLimiter for FixedWindowLimiter<S> {
    fn check(&self, client_id: &str, now_ms: u64) -> RateLimitState {
        let previous = self.store.load(client_id);
        let (entry, state) = advance_window(previous, now_ms, &self.config);
        self.store.save(client_id, entry, now_ms);
        state
    }
}

/// Default number of tracked clients before expired windows are pruned.
pub const DEFAULT_PRUNE_THRESHOLD: usize = 10_000;

/// Process-local window store.
#[derive(Debug)]
pub struct InMemoryWindowStore {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    prune_threshold: usize,
}

impl Default for InMemoryWindowStore {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
        }
    }
}

impl InMemoryWindowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prune expired windows once more than `threshold` clients are tracked.
    pub fn with_prune_threshold(mut self, threshold: usize) -> Self {
        self.prune_threshold = threshold;
        self
    }

    /// Number of tracked clients.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether no clients are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WindowStore for InMemoryWindowStore {
    fn load(&self, client_id: &str) -> Option<RateLimitEntry> {
        self.entries.lock().ok()?.get(client_id).copied()
    }

    fn save(&self, client_id: &str, entry: RateLimitEntry, now_ms: u64) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.insert(client_id.to_string(), entry);
        if entries.len() > self.prune_threshold {
            entries.retain(|_, e| e.window_reset_at_ms > now_ms);
        }
    }
}
