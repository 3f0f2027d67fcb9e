//! In-memory stores
//!
//! `RwLock<BTreeMap>` tables with auto-increment ids and unique-column checks.
//! Used by the server binary and by tests; a database-backed store would
//! implement the same traits.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::models::{AutoPolicy, PolicyFilter, Role, User};
use crate::store::{PolicyStore, StoreError, StoreResult, UserStore};

/// A record the in-memory table knows how to key and constrain.
trait StoredRecord: Clone {
    fn id(&self) -> Option<u64>;
    fn set_id(&mut self, id: u64);
    /// (column, value) pairs that must be unique across the table
    fn unique_columns(&self) -> Vec<(&'static str, String)>;
}

impl StoredRecord for AutoPolicy {
    fn id(&self) -> Option<u64> {
        self.core.id
    }

    fn set_id(&mut self, id: u64) {
        self.core.id = Some(id);
    }

    fn unique_columns(&self) -> Vec<(&'static str, String)> {
        vec![("Policy number", self.core.policy_number.clone())]
    }
}

impl StoredRecord for User {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn unique_columns(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Username", self.username.clone()),
            ("Email", self.email.clone()),
        ]
    }
}

// == Table ==
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: StoredRecord> Table<T> {
    fn conflict(&self, record: &T, pending: &[T]) -> Option<StoreError> {
        let id = record.id();
        for (column, value) in record.unique_columns() {
            let taken = self
                .rows
                .values()
                .chain(pending.iter())
                .filter(|other| id.is_none() || other.id() != id)
                .any(|other| other.unique_columns().contains(&(column, value.clone())));
            if taken {
                return Some(StoreError::Duplicate(format!(
                    "{} already exists: {}",
                    column, value
                )));
            }
        }
        None
    }

    fn insert(&mut self, mut record: T) -> T {
        let id = match record.id() {
            Some(id) => id,
            None => self.next_id,
        };
        self.next_id = self.next_id.max(id + 1);
        record.set_id(id);
        self.rows.insert(id, record.clone());
        record
    }

    fn save(&mut self, record: T) -> StoreResult<T> {
        if let Some(err) = self.conflict(&record, &[]) {
            return Err(err);
        }
        Ok(self.insert(record))
    }

    fn save_all(&mut self, records: Vec<T>) -> StoreResult<Vec<T>> {
        let mut accepted: Vec<T> = Vec::with_capacity(records.len());
        for record in records {
            if let Some(err) = self.conflict(&record, &accepted) {
                return Err(err);
            }
            accepted.push(record);
        }
        Ok(accepted.into_iter().map(|r| self.insert(r)).collect())
    }

    fn delete(&mut self, id: u64, entity: &str) -> StoreResult<()> {
        self.rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("{} with ID {} not found", entity, id)))
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

// == Memory Table Wrapper ==
#[derive(Debug)]
struct Shared<T> {
    table: RwLock<Table<T>>,
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self {
            table: RwLock::new(Table::default()),
        }
    }
}

impl<T> Shared<T> {
    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Table<T>>> {
        self.table.read().map_err(|_| poisoned())
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Table<T>>> {
        self.table.write().map_err(|_| poisoned())
    }
}

// == Memory Policy Store ==
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    inner: Shared<AutoPolicy>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn find_by_id(&self, id: u64) -> StoreResult<Option<AutoPolicy>> {
        Ok(self.inner.read()?.rows.get(&id).cloned())
    }

    fn find_by_policy_number(&self, policy_number: &str) -> StoreResult<Option<AutoPolicy>> {
        Ok(self
            .inner
            .read()?
            .rows
            .values()
            .find(|p| p.core.policy_number == policy_number)
            .cloned())
    }

    fn find_all(&self) -> StoreResult<Vec<AutoPolicy>> {
        Ok(self.inner.read()?.rows.values().cloned().collect())
    }

    fn find_filtered(&self, filter: &PolicyFilter) -> StoreResult<Vec<AutoPolicy>> {
        let table = self.inner.read()?;
        let matched: Vec<AutoPolicy> = table
            .rows
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        debug!(matched = matched.len(), scanned = table.rows.len(), "filtered policies");
        Ok(matched)
    }

    fn save(&self, policy: AutoPolicy) -> StoreResult<AutoPolicy> {
        self.inner.write()?.save(policy)
    }

    fn save_all(&self, policies: Vec<AutoPolicy>) -> StoreResult<Vec<AutoPolicy>> {
        self.inner.write()?.save_all(policies)
    }

    fn exists_by_id(&self, id: u64) -> StoreResult<bool> {
        Ok(self.inner.read()?.rows.contains_key(&id))
    }

    fn delete_by_id(&self, id: u64) -> StoreResult<()> {
        self.inner.write()?.delete(id, "AutoPolicy")
    }
}

// == Memory User Store ==
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    inner: Shared<User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn taken_by_other(
    users: &BTreeMap<u64, User>,
    exclude_id: Option<u64>,
    pick: impl Fn(&User) -> bool,
) -> bool {
    users
        .iter()
        .filter(|(id, _)| Some(**id) != exclude_id)
        .any(|(_, user)| pick(user))
}

impl UserStore for MemoryUserStore {
    fn find_by_id(&self, id: u64) -> StoreResult<Option<User>> {
        Ok(self.inner.read()?.rows.get(&id).cloned())
    }

    fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .inner
            .read()?
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    fn find_all(&self) -> StoreResult<Vec<User>> {
        Ok(self.inner.read()?.rows.values().cloned().collect())
    }

    fn find_by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        Ok(self
            .inner
            .read()?
            .rows
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect())
    }

    fn exists_by_username(&self, username: &str, exclude_id: Option<u64>) -> StoreResult<bool> {
        let table = self.inner.read()?;
        Ok(taken_by_other(&table.rows, exclude_id, |u| u.username == username))
    }

    fn exists_by_email(&self, email: &str, exclude_id: Option<u64>) -> StoreResult<bool> {
        let table = self.inner.read()?;
        Ok(taken_by_other(&table.rows, exclude_id, |u| u.email == email))
    }

    fn save(&self, user: User) -> StoreResult<User> {
        self.inner.write()?.save(user)
    }

    fn exists_by_id(&self, id: u64) -> StoreResult<bool> {
        Ok(self.inner.read()?.rows.contains_key(&id))
    }

    fn delete_by_id(&self, id: u64) -> StoreResult<()> {
        self.inner.write()?.delete(id, "User")
    }
}
