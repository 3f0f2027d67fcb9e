//! Cache Region Module
//!
//! A named, thread-safe cache region. Each region owns its own lock, so
//! traffic on one region never waits on another, and no lock is held while
//! the backing store is being consulted.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cache::{BoundedCache, CacheStats, RegionSettings};

// == Lookup ==
/// Result of a cache lookup.
#[derive(Debug)]
pub enum Lookup<V> {
    /// The cached value
    Hit(V),
    /// Nothing usable is cached; the ticket authorizes a later [`CacheRegion::populate`]
    Miss(LoadTicket),
}

/// Proof of which region generation a miss was observed in.
///
/// Any invalidation or write-through put advances the generation, and a
/// populate carrying an older ticket is dropped: the value it carries may have
/// been read from the store before that write landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug)]
struct RegionState<K, V> {
    cache: BoundedCache<K, V>,
    generation: u64,
}

impl<K, V> RegionState<K, V> {
    fn advance(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

// == Cache Region ==
/// An independently configured, named cache.
#[derive(Debug)]
pub struct CacheRegion<K, V> {
    name: &'static str,
    state: Mutex<RegionState<K, V>>,
}

impl<K, V> CacheRegion<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty region from its settings.
    pub fn new(name: &'static str, settings: RegionSettings) -> Self {
        Self {
            name,
            state: Mutex::new(RegionState {
                cache: BoundedCache::new(settings.max_entries, Some(settings.ttl)),
                generation: 0,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    // A panic while holding the lock cannot leave the cache half-written in a
    // way that breaks later readers, so poisoning is ignored.
    fn state(&self) -> MutexGuard<'_, RegionState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Lookup ==
    /// Looks `key` up, handing out a [`LoadTicket`] on a miss.
    pub fn lookup(&self, key: &K) -> Lookup<V> {
        let mut state = self.state();
        match state.cache.get(key) {
            Some(value) => Lookup::Hit(value),
            None => Lookup::Miss(LoadTicket {
                generation: state.generation,
            }),
        }
    }

    /// Plain read without a ticket.
    pub fn get(&self, key: &K) -> Option<V> {
        match self.lookup(key) {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss(_) => None,
        }
    }

    // == Populate ==
    /// Stores a value loaded after a miss.
    ///
    /// Returns false, storing nothing, when the region was written or
    /// invalidated since `ticket` was issued.
    pub fn populate(&self, key: K, value: V, ticket: LoadTicket) -> bool {
        let mut state = self.state();
        if state.generation != ticket.generation {
            trace!(region = self.name, ?key, "discarding load that raced a write");
            return false;
        }
        state.cache.put(key, value);
        true
    }

    // == Get Or Load ==
    /// Returns the cached value for `key`, loading and caching it on a miss.
    ///
    /// The loader runs without the region lock held. Its errors are returned
    /// unchanged and nothing is cached for them.
    pub fn get_or_load<E, F>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        let ticket = match self.lookup(&key) {
            Lookup::Hit(value) => {
                debug!(region = self.name, ?key, "cache hit");
                return Ok(value);
            }
            Lookup::Miss(ticket) => ticket,
        };
        debug!(region = self.name, ?key, "cache miss");

        let started = Instant::now();
        let loaded = load(&key);
        self.record_load(loaded.is_ok(), started.elapsed());

        let value = loaded?;
        self.populate(key, value.clone(), ticket);
        Ok(value)
    }

    // == Put ==
    /// Write-through: replaces the entry for `key` with a freshly computed value.
    pub fn put(&self, key: K, value: V) {
        let mut state = self.state();
        state.advance();
        state.cache.put(key, value);
    }

    // == Invalidate ==
    /// Removes the entry for `key`; no-op if absent.
    pub fn invalidate(&self, key: &K) {
        let mut state = self.state();
        state.advance();
        if state.cache.invalidate(key) {
            trace!(region = self.name, ?key, "invalidated entry");
        }
    }

    // == Invalidate All ==
    /// Empties the region.
    pub fn invalidate_all(&self) {
        let mut state = self.state();
        state.advance();
        let dropped = state.cache.invalidate_all();
        if dropped > 0 {
            debug!(region = self.name, dropped, "cleared region");
        }
    }

    /// Removes expired entries, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        self.state().cache.cleanup_expired()
    }

    pub fn record_load(&self, success: bool, elapsed: Duration) {
        self.state().cache.record_load(success, elapsed);
    }

    pub fn stats(&self) -> CacheStats {
        self.state().cache.stats()
    }

    pub fn len(&self) -> usize {
        self.state().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn region(max_entries: Option<usize>) -> CacheRegion<u64, String> {
        CacheRegion::new(
            "test",
            RegionSettings::new(Duration::from_secs(60), max_entries),
        )
    }

    #[test]
    fn test_get_or_load_caches_value() {
        let region = region(None);
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<String, ()> = region.get_or_load(7, |id| {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(format!("policy-{}", id))
            });
            assert_eq!(value.unwrap(), "policy-7");
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        let stats = region.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.load_successes, 1);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let region = region(None);

        let first: Result<String, &str> = region.get_or_load(1, |_| Err("not found"));
        assert_eq!(first, Err("not found"));
        assert!(region.is_empty());

        let second: Result<String, &str> = region.get_or_load(1, |_| Ok("created".to_string()));
        assert_eq!(second.unwrap(), "created");

        let stats = region.stats();
        assert_eq!(stats.load_failures, 1);
        assert_eq!(stats.load_successes, 1);
    }

    #[test]
    fn test_populate_rejected_after_invalidation() {
        let region = region(None);

        let ticket = match region.lookup(&1) {
            Lookup::Miss(ticket) => ticket,
            Lookup::Hit(_) => panic!("empty region cannot hit"),
        };

        // a writer lands between the miss and the populate
        region.invalidate(&1);

        assert!(!region.populate(1, "stale".to_string(), ticket));
        assert_eq!(region.get(&1), None);
    }

    #[test]
    fn test_populate_rejected_after_write_through() {
        let region = region(None);

        let Lookup::Miss(ticket) = region.lookup(&1) else {
            panic!("empty region cannot hit");
        };
        region.put(1, "fresh".to_string());

        assert!(!region.populate(1, "stale".to_string(), ticket));
        assert_eq!(region.get(&1), Some("fresh".to_string()));
    }

    #[test]
    fn test_populate_accepted_without_interference() {
        let region = region(None);

        let Lookup::Miss(ticket) = region.lookup(&1) else {
            panic!("empty region cannot hit");
        };

        assert!(region.populate(1, "v".to_string(), ticket));
        assert_eq!(region.get(&1), Some("v".to_string()));
    }

    #[test]
    fn test_bounded_region_capacity() {
        let region = region(Some(3));
        for id in 0..10 {
            region.put(id, id.to_string());
        }

        assert_eq!(region.len(), 3);
        assert_eq!(region.stats().evictions, 7);
    }

    #[test]
    fn test_concurrent_loads_do_not_corrupt() {
        let region = Arc::new(region(Some(16)));
        let loads = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let region = Arc::clone(&region);
                let loads = Arc::clone(&loads);
                thread::spawn(move || {
                    for i in 0..200u64 {
                        let key = (i + t) % 32;
                        let value: Result<String, ()> = region.get_or_load(key, |k| {
                            loads.fetch_add(1, Ordering::SeqCst);
                            Ok(format!("value-{}", k))
                        });
                        assert_eq!(value.unwrap(), format!("value-{}", key));
                        if i % 50 == 0 {
                            region.invalidate_all();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(region.len() <= 16);
        assert!(loads.load(Ordering::SeqCst) >= 32);
    }
}
