//! Persistent Store Module
//!
//! The durable repositories the query services read through. The services
//! only depend on the traits; [`memory`] provides in-process implementations.

pub mod memory;

use thiserror::Error;

use crate::models::{AutoPolicy, PolicyFilter, Role, User};

pub use memory::{MemoryPolicyStore, MemoryUserStore};

// == Store Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    /// A unique column already holds the value
    #[error("{0}")]
    Duplicate(String),

    /// The store could not serve the request; callers may retry later
    #[error("{0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Policy Store ==
/// Repository of auto policies.
pub trait PolicyStore: Send + Sync {
    fn find_by_id(&self, id: u64) -> StoreResult<Option<AutoPolicy>>;

    fn find_by_policy_number(&self, policy_number: &str) -> StoreResult<Option<AutoPolicy>>;

    fn find_all(&self) -> StoreResult<Vec<AutoPolicy>>;

    /// Policies matching every predicate in `filter`.
    fn find_filtered(&self, filter: &PolicyFilter) -> StoreResult<Vec<AutoPolicy>>;

    /// Inserts or replaces; assigns an id to new records.
    fn save(&self, policy: AutoPolicy) -> StoreResult<AutoPolicy>;

    /// Saves all policies or none of them.
    fn save_all(&self, policies: Vec<AutoPolicy>) -> StoreResult<Vec<AutoPolicy>>;

    fn exists_by_id(&self, id: u64) -> StoreResult<bool>;

    fn delete_by_id(&self, id: u64) -> StoreResult<()>;
}

// == User Store ==
/// Repository of users.
pub trait UserStore: Send + Sync {
    fn find_by_id(&self, id: u64) -> StoreResult<Option<User>>;

    fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    fn find_all(&self) -> StoreResult<Vec<User>>;

    fn find_by_role(&self, role: Role) -> StoreResult<Vec<User>>;

    /// Whether a user other than `exclude_id` already has this username.
    fn exists_by_username(&self, username: &str, exclude_id: Option<u64>) -> StoreResult<bool>;

    /// Whether a user other than `exclude_id` already has this email.
    fn exists_by_email(&self, email: &str, exclude_id: Option<u64>) -> StoreResult<bool>;

    fn save(&self, user: User) -> StoreResult<User>;

    fn exists_by_id(&self, id: u64) -> StoreResult<bool>;

    fn delete_by_id(&self, id: u64) -> StoreResult<()>;
}
