//! Cache Statistics Module
//!
//! Counts how cached dispatches were served.

use serde::Serialize;

// == Cache Stats ==
/// Dispatch counters for one cache instance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Dispatches answered from a resolved entry
    pub hits: u64,
    /// Dispatches that started an underlying dispatch
    pub misses: u64,
    /// Dispatches that joined an in-flight underlying dispatch
    pub coalesced: u64,
    /// Dispatches that skipped the cache because no key could be derived
    pub bypassed: u64,
    /// Underlying dispatches that failed and were dropped from the cache
    pub failures: u64,
    /// Current number of entries, pending ones included
    pub total_entries: usize,
    /// RFC 3339 time the snapshot was taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Share of cache-eligible dispatches that did not start a new dispatch.
    ///
    /// Coalesced calls count as hits. Returns 0.0 before any dispatch.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.coalesced;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_coalesced(&mut self) {
        self.coalesced += 1;
    }

    pub fn record_bypass(&mut self) {
        self.bypassed += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Copies the counters and stamps them with the current time.
    pub fn snapshot(&self, total_entries: usize) -> Self {
        Self {
            total_entries,
            captured_at: Some(chrono::Utc::now().to_rfc3339()),
            ..self.clone()
        }
    }
}
