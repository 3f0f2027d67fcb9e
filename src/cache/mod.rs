//! Cache Module
//!
//! Multi-region read cache with TTL expiration, LRU eviction, filter
//! fingerprinting and write-driven invalidation.

mod bounded;
mod entry;
mod fingerprint;
mod invalidation;
mod lru;
mod region;
pub mod settings;
mod stats;


// Re-export public types
pub use bounded::BoundedCache;
pub use entry::{current_timestamp_ms, CacheEntry};
pub use fingerprint::{FilterKey, Fingerprint, ABSENT};
pub use invalidation::{EntityCaches, Mutation, RegionNames, ALL_KEY};
pub use lru::LruTracker;
pub use region::{CacheRegion, LoadTicket, Lookup};
pub use settings::{CachePolicy, RegionSettings};
pub use stats::CacheStats;
