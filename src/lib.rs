//! Policy Cache - a policy and user record service with a multi-region read-through cache
//!
//! Reads are served from named cache regions with per-region TTL and capacity;
//! writes go to the store first and then invalidate the affected regions.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
