//! Background Tasks Module
//!
//! # Tasks
//! - TTL Cleanup: Sweeps expired entries from every cache region at the configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
