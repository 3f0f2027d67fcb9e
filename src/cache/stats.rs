//! Cache Statistics Module
//!
//! Tracks per-region performance metrics: hits, misses, loads and evictions.

use std::time::Duration;

use serde::Serialize;

// == Cache Stats ==
/// Performance counters for one cache region.
///
/// Counters are observational only; nothing in the cache reads them back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing (absent or expired)
    pub misses: u64,
    /// Backing-store loads that produced a value
    pub load_successes: u64,
    /// Backing-store loads that failed (including not-found)
    pub load_failures: u64,
    /// Wall time spent in backing-store loads, in nanoseconds
    pub total_load_time_ns: u64,
    /// Entries dropped to make room for a new key
    pub evictions: u64,
    /// Current number of entries in the region
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Record Load ==
    /// Records the outcome and duration of one backing-store load.
    pub fn record_load(&mut self, success: bool, elapsed: Duration) {
        if success {
            self.load_successes += 1;
        } else {
            self.load_failures += 1;
        }
        self.total_load_time_ns = self
            .total_load_time_ns
            .saturating_add(elapsed.as_nanos() as u64);
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
