//! Bounded Cache Module
//!
//! Single-threaded cache engine combining HashMap storage with LRU tracking
//! and TTL expiration. Thread safety is layered on top by [`CacheRegion`].
//!
//! [`CacheRegion`]: crate::cache::CacheRegion

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStats, LruTracker};

// == Bounded Cache ==
/// Key-value storage with optional capacity bound, per-cache TTL and LRU eviction.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker<K>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed, None = unbounded
    max_entries: Option<usize>,
    /// Lifetime of every entry written to this cache
    ttl: Option<Duration>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a new cache.
    ///
    /// # Arguments
    /// * `max_entries` - Capacity bound, `None` for an unbounded cache
    /// * `ttl` - Entry lifetime, `None` for entries that never expire
    pub fn new(max_entries: Option<usize>, ttl: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            ttl,
        }
    }

    // == Put ==
    /// Inserts or replaces the value for `key`, resetting its TTL.
    ///
    /// Replacing an existing key is an update. Inserting a new key into a full
    /// cache first evicts the least recently used entry and records the eviction.
    pub fn put(&mut self, key: K, value: V) {
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite {
            if let Some(max_entries) = self.max_entries {
                while self.entries.len() >= max_entries {
                    match self.lru.evict_oldest() {
                        Some(evicted_key) => {
                            self.entries.remove(&evicted_key);
                            self.stats.record_eviction();
                        }
                        None => break,
                    }
                }
            }
        }

        // a zero-capacity cache stores nothing
        if self.max_entries == Some(0) {
            return;
        }

        self.entries
            .insert(key.clone(), CacheEntry::new(value, self.ttl));
        self.lru.touch(&key);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a copy of the value for `key`.
    ///
    /// Expired entries are removed on access and counted as misses; a hit
    /// marks the key as most recently used.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Invalidate ==
    /// Removes the entry for `key`, returning whether one was present.
    pub fn invalidate(&mut self, key: &K) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Invalidate All ==
    /// Empties the cache and returns how many entries were dropped.
    ///
    /// Explicit invalidation is not counted as eviction.
    pub fn invalidate_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.set_total_entries(self.entries.len());
        expired_keys.len()
    }

    /// Records the outcome of a backing-store load performed on behalf of this cache.
    pub fn record_load(&mut self, success: bool, elapsed: Duration) {
        self.stats.record_load(success, elapsed);
    }

    // == Stats ==
    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the current number of entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
