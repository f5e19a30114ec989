//! Request lifecycle timing and wall-clock access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time from request start to a recorded mark.
    pub fn mark_offset(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of wall-clock time in milliseconds since the Unix epoch.
///
/// Freshness and rate-limit windows are computed against this so handlers can
/// be driven by a controllable clock in tests.
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds.
    fn now_ms(&self) -> u64;
}

/// Clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Manually advanced clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now_ms(), 3_000);
        clock.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn test_timing_marks() {
        let mut timing = TimingContext::new();
        assert!(timing.mark_offset("upstream").is_none());
        timing.mark("upstream");
        assert!(timing.mark_offset("upstream").is_some());
    }
}
