//! Policy Query Service
//!
//! Reads go cache region -> store on miss -> populate; writes go store ->
//! invalidation -> return.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::settings::{ALL_POLICIES, FILTERED_POLICIES, POLICIES, POLICY_NUMBERS};
use crate::cache::{
    CachePolicy, CacheStats, EntityCaches, Fingerprint, Mutation, RegionNames, ALL_KEY,
};
use crate::error::{AppError, Result};
use crate::models::mapper::{dto_to_policy, policy_to_dto};
use crate::models::{PolicyDto, PolicyFilter};
use crate::store::{PolicyStore, StoreError};

pub const POLICY_REGIONS: RegionNames = RegionNames {
    by_id: POLICIES,
    by_key: POLICY_NUMBERS,
    all: ALL_POLICIES,
    filtered: FILTERED_POLICIES,
};

fn store_failure(err: StoreError) -> AppError {
    if let StoreError::Unavailable(msg) = &err {
        warn!(error = %msg, "policy store unavailable");
    }
    err.into()
}

// == Policy Service ==
pub struct PolicyService {
    store: Arc<dyn PolicyStore>,
    caches: EntityCaches<PolicyDto>,
}

impl PolicyService {
    pub fn new(store: Arc<dyn PolicyStore>, policy: &CachePolicy) -> Self {
        Self {
            store,
            caches: EntityCaches::new(POLICY_REGIONS, policy),
        }
    }

    pub fn caches(&self) -> &EntityCaches<PolicyDto> {
        &self.caches
    }

    // == Reads ==

    /// Single policy by id, cached in `policies`. Not-found is never cached.
    pub fn get_policy_by_id(&self, id: u64) -> Result<PolicyDto> {
        self.caches.by_id.get_or_load(id, |&id| {
            self.store
                .find_by_id(id)
                .map_err(store_failure)?
                .map(|policy| policy_to_dto(&policy))
                .ok_or_else(|| AppError::NotFound(format!("AutoPolicy not found with ID: {}", id)))
        })
    }

    /// Single policy by policy number, cached in `policyNumbers`.
    pub fn get_policy_by_number(&self, policy_number: &str) -> Result<PolicyDto> {
        self.caches
            .by_key
            .get_or_load(policy_number.to_string(), |number| {
                self.store
                    .find_by_policy_number(number)
                    .map_err(store_failure)?
                    .map(|policy| policy_to_dto(&policy))
                    .ok_or_else(|| {
                        AppError::NotFound(format!("AutoPolicy with number {} not found", number))
                    })
            })
    }

    /// Every policy, cached under a single key. An empty list is cached like any other.
    pub fn get_all_policies(&self) -> Result<Vec<PolicyDto>> {
        self.caches.all.get_or_load(ALL_KEY, |_| {
            let policies = self.store.find_all().map_err(store_failure)?;
            Ok(policies.iter().map(policy_to_dto).collect())
        })
    }

    /// Policies matching `filter`, cached per filter fingerprint in `filteredPolicies`.
    ///
    /// The filter is validated before the cache is touched.
    pub fn get_filtered_policies(&self, filter: &PolicyFilter) -> Result<Vec<PolicyDto>> {
        filter.validate()?;
        self.caches.filtered.get_or_load(filter.fingerprint(), |_| {
            let policies = self.store.find_filtered(filter).map_err(store_failure)?;
            Ok(policies.iter().map(policy_to_dto).collect())
        })
    }

    // == Writes ==

    /// Creates a policy. A taken policy number fails before anything is written.
    pub fn create_policy(&self, dto: PolicyDto) -> Result<PolicyDto> {
        let mut record = dto_to_policy(&dto)?;
        record.core.id = None;

        let _writes = self.caches.lock_writes();
        if self
            .store
            .find_by_policy_number(record.policy_number())
            .map_err(store_failure)?
            .is_some()
        {
            return Err(AppError::DuplicateKey(format!(
                "Policy number already exists: {}",
                record.policy_number()
            )));
        }

        let saved = self.store.save(record).map_err(store_failure)?;
        self.caches.apply(Mutation::Created);

        info!(id = ?saved.id(), policy_number = saved.policy_number(), "policy created");
        Ok(policy_to_dto(&saved))
    }

    /// Creates several policies at once; either all are saved or none.
    pub fn create_policies(&self, dtos: Vec<PolicyDto>) -> Result<Vec<PolicyDto>> {
        let mut records = Vec::with_capacity(dtos.len());
        let mut numbers = HashSet::with_capacity(dtos.len());

        for dto in &dtos {
            let mut record = dto_to_policy(dto)?;
            record.core.id = None;
            if !numbers.insert(record.core.policy_number.clone()) {
                return Err(AppError::DuplicateKey(format!(
                    "Policy number repeated in batch: {}",
                    record.policy_number()
                )));
            }
            records.push(record);
        }

        let _writes = self.caches.lock_writes();
        for record in &records {
            if self
                .store
                .find_by_policy_number(record.policy_number())
                .map_err(store_failure)?
                .is_some()
            {
                return Err(AppError::DuplicateKey(format!(
                    "Policy number already exists: {}",
                    record.policy_number()
                )));
            }
        }

        let saved = self.store.save_all(records).map_err(store_failure)?;
        self.caches.apply(Mutation::BatchCreated { count: saved.len() });

        info!(count = saved.len(), "policies created in batch");
        Ok(saved.iter().map(policy_to_dto).collect())
    }

    /// Replaces the policy stored under `id` (the path id wins over any id in
    /// the body) and writes the new value through to the `policies` region.
    pub fn update_policy(&self, id: u64, dto: PolicyDto) -> Result<PolicyDto> {
        let mut record = dto_to_policy(&dto)?;

        let _writes = self.caches.lock_writes();
        if !self.store.exists_by_id(id).map_err(store_failure)? {
            return Err(AppError::NotFound(format!("AutoPolicy not found with ID: {}", id)));
        }

        record.core.id = Some(id);
        let saved = self.store.save(record).map_err(store_failure)?;
        let updated = policy_to_dto(&saved);
        self.caches.apply(Mutation::Updated {
            id,
            value: &updated,
        });

        info!(id, "policy updated");
        Ok(updated)
    }

    pub fn delete_policy(&self, id: u64) -> Result<()> {
        let _writes = self.caches.lock_writes();
        if !self.store.exists_by_id(id).map_err(store_failure)? {
            return Err(AppError::NotFound(format!(
                "AutoPolicy with ID {} not found",
                id
            )));
        }

        self.store.delete_by_id(id).map_err(store_failure)?;
        self.caches.apply(Mutation::Deleted { id });

        info!(id, "policy deleted");
        Ok(())
    }

    // == Admin ==

    /// Drops every cached filter result.
    pub fn clear_filtered_cache(&self) {
        self.caches.clear_filtered();
        info!("filtered policy cache cleared");
    }

    pub fn cache_stats(&self) -> BTreeMap<&'static str, CacheStats> {
        self.caches.stats()
    }

    pub fn cleanup_expired(&self) -> usize {
        self.caches.cleanup_expired()
    }
}
