//! Query Services
//!
//! Orchestrate cache lookups, store access and invalidation for each entity type.

pub mod policy;
pub mod user;

pub use policy::{PolicyService, POLICY_REGIONS};
pub use user::{UserService, USER_REGIONS};
