//! Invalidation Module
//!
//! Groups the four cache regions of one entity type and evicts whatever a
//! mutation could have made stale.
//!
//! | mutation      | by id            | by key | all   | filtered |
//! |---------------|------------------|--------|-------|----------|
//! | create, batch | -                | clear  | clear | clear    |
//! | update(id)    | write-through id | clear  | clear | clear    |
//! | delete(id)    | evict id         | clear  | clear | clear    |
//!
//! Filtered results are cleared wholesale: working out which cached filters a
//! single record change affects would mean re-evaluating every cached
//! predicate, and a missed invalidation serves stale data while an extra one
//! only costs a reload.
//!
//! Writers hold [`EntityCaches::lock_writes`] from the store write until the
//! mutation is applied, so two writes to one entity type can never apply their
//! cache effects out of store order.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::cache::{CachePolicy, CacheRegion, CacheStats};

/// Key under which the all-records region stores its single list.
pub const ALL_KEY: &str = "all";

/// Region names for one entity type.
#[derive(Debug, Clone, Copy)]
pub struct RegionNames {
    pub by_id: &'static str,
    pub by_key: &'static str,
    pub all: &'static str,
    pub filtered: &'static str,
}

// == Mutation ==
/// A completed write against the backing store.
#[derive(Debug)]
pub enum Mutation<'a, V> {
    Created,
    BatchCreated { count: usize },
    Updated { id: u64, value: &'a V },
    Deleted { id: u64 },
}

impl<V> Mutation<'_, V> {
    fn kind(&self) -> &'static str {
        match self {
            Mutation::Created => "create",
            Mutation::BatchCreated { .. } => "batch-create",
            Mutation::Updated { .. } => "update",
            Mutation::Deleted { .. } => "delete",
        }
    }
}

// == Entity Caches ==
/// Point, list and filter caches for one entity type.
#[derive(Debug)]
pub struct EntityCaches<V> {
    pub by_id: CacheRegion<u64, V>,
    pub by_key: CacheRegion<String, V>,
    pub all: CacheRegion<&'static str, Vec<V>>,
    pub filtered: CacheRegion<String, Vec<V>>,
    writes: Mutex<()>,
}

impl<V: Clone> EntityCaches<V> {
    pub fn new(names: RegionNames, policy: &CachePolicy) -> Self {
        Self {
            by_id: CacheRegion::new(names.by_id, policy.settings(names.by_id)),
            by_key: CacheRegion::new(names.by_key, policy.settings(names.by_key)),
            all: CacheRegion::new(names.all, policy.settings(names.all)),
            filtered: CacheRegion::new(names.filtered, policy.settings(names.filtered)),
            writes: Mutex::new(()),
        }
    }

    /// Serializes writers of this entity type.
    ///
    /// Hold the guard across the store write and the matching [`apply`](Self::apply);
    /// readers never take it.
    pub fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Apply ==
    /// Evicts (or refreshes) every entry `mutation` may have made stale.
    ///
    /// Must run after the store write has completed and before the write is
    /// acknowledged to the caller.
    pub fn apply(&self, mutation: Mutation<'_, V>) {
        let kind = mutation.kind();
        match mutation {
            Mutation::Created | Mutation::BatchCreated { .. } => {}
            Mutation::Updated { id, value } => self.by_id.put(id, value.clone()),
            Mutation::Deleted { id } => self.by_id.invalidate(&id),
        }

        self.by_key.invalidate_all();
        self.all.invalidate_all();
        self.filtered.invalidate_all();

        debug!(
            entity = self.by_id.name(),
            mutation = kind,
            "applied cache invalidation"
        );
    }

    /// Drops every cached filter result.
    pub fn clear_filtered(&self) {
        self.filtered.invalidate_all();
    }

    /// Empties all four regions.
    pub fn clear_all(&self) {
        self.by_id.invalidate_all();
        self.by_key.invalidate_all();
        self.all.invalidate_all();
        self.filtered.invalidate_all();
    }

    /// Sweeps expired entries from all four regions.
    pub fn cleanup_expired(&self) -> usize {
        self.by_id.cleanup_expired()
            + self.by_key.cleanup_expired()
            + self.all.cleanup_expired()
            + self.filtered.cleanup_expired()
    }

    pub fn stats(&self) -> BTreeMap<&'static str, CacheStats> {
        BTreeMap::from([
            (self.by_id.name(), self.by_id.stats()),
            (self.by_key.name(), self.by_key.stats()),
            (self.all.name(), self.all.stats()),
            (self.filtered.name(), self.filtered.stats()),
        ])
    }
}
