//! User Query Service

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::cache::settings::{ALL_USERS, USERNAMES, USERS, USERS_BY_ROLE};
use crate::cache::{
    CachePolicy, CacheStats, EntityCaches, Fingerprint, Mutation, RegionNames, ALL_KEY,
};
use crate::error::{AppError, Result};
use crate::models::mapper::{request_to_user, user_to_response};
use crate::models::{Role, UserRequest, UserResponse};
use crate::store::{StoreError, UserStore};

/// Users by role fill the filtered-query slot.
pub const USER_REGIONS: RegionNames = RegionNames {
    by_id: USERS,
    by_key: USERNAMES,
    all: ALL_USERS,
    filtered: USERS_BY_ROLE,
};

fn store_failure(err: StoreError) -> AppError {
    if let StoreError::Unavailable(msg) = &err {
        warn!(error = %msg, "user store unavailable");
    }
    err.into()
}

fn user_not_found(id: u64) -> AppError {
    AppError::NotFound(format!("User not found with id: {}", id))
}

// == User Service ==
pub struct UserService {
    store: Arc<dyn UserStore>,
    caches: EntityCaches<UserResponse>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, policy: &CachePolicy) -> Self {
        Self {
            store,
            caches: EntityCaches::new(USER_REGIONS, policy),
        }
    }

    pub fn caches(&self) -> &EntityCaches<UserResponse> {
        &self.caches
    }

    fn ensure_unique(&self, request: &UserRequest, exclude_id: Option<u64>) -> Result<()> {
        let username = request.username.trim();
        let email = request.email.trim();

        if self
            .store
            .exists_by_username(username, exclude_id)
            .map_err(store_failure)?
        {
            return Err(AppError::DuplicateKey(format!(
                "Username already exists: {}",
                username
            )));
        }
        if self
            .store
            .exists_by_email(email, exclude_id)
            .map_err(store_failure)?
        {
            return Err(AppError::DuplicateKey(format!(
                "Email already exists: {}",
                email
            )));
        }
        Ok(())
    }

    // == Reads ==

    pub fn get_user_by_id(&self, id: u64) -> Result<UserResponse> {
        self.caches.by_id.get_or_load(id, |&id| {
            self.store
                .find_by_id(id)
                .map_err(store_failure)?
                .map(|user| user_to_response(&user))
                .ok_or_else(|| user_not_found(id))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<UserResponse> {
        self.caches
            .by_key
            .get_or_load(username.to_string(), |username| {
                self.store
                    .find_by_username(username)
                    .map_err(store_failure)?
                    .map(|user| user_to_response(&user))
                    .ok_or_else(|| {
                        AppError::NotFound(format!("User not found with username: {}", username))
                    })
            })
    }

    /// Users holding `role`. An unknown role is rejected before the cache is consulted.
    pub fn get_users_by_role(&self, role: &str) -> Result<Vec<UserResponse>> {
        let role = Role::parse(role)?;
        self.caches.filtered.get_or_load(role.fingerprint(), |_| {
            let users = self.store.find_by_role(role).map_err(store_failure)?;
            Ok(users.iter().map(user_to_response).collect())
        })
    }

    pub fn get_all_users(&self) -> Result<Vec<UserResponse>> {
        self.caches.all.get_or_load(ALL_KEY, |_| {
            let users = self.store.find_all().map_err(store_failure)?;
            Ok(users.iter().map(user_to_response).collect())
        })
    }

    // == Writes ==

    pub fn create_user(&self, request: UserRequest) -> Result<UserResponse> {
        let user = request_to_user(&request, Utc::now())?;
        let _writes = self.caches.lock_writes();
        self.ensure_unique(&request, None)?;

        let saved = self.store.save(user).map_err(store_failure)?;
        self.caches.apply(Mutation::Created);

        info!(username = %saved.username, "user created");
        Ok(user_to_response(&saved))
    }

    /// Updates username, email and role; the new value is written through to `users`.
    pub fn update_user(&self, id: u64, request: UserRequest) -> Result<UserResponse> {
        if let Some(msg) = request.validate() {
            return Err(AppError::Validation(msg));
        }

        let _writes = self.caches.lock_writes();
        let mut existing = self
            .store
            .find_by_id(id)
            .map_err(store_failure)?
            .ok_or_else(|| user_not_found(id))?;
        self.ensure_unique(&request, Some(id))?;

        existing.username = request.username.trim().to_string();
        existing.email = request.email.trim().to_string();
        if let Some(role) = request.role {
            existing.role = role;
        }

        let saved = self.store.save(existing).map_err(store_failure)?;
        let updated = user_to_response(&saved);
        self.caches.apply(Mutation::Updated {
            id,
            value: &updated,
        });

        info!(username = %updated.username, "user updated");
        Ok(updated)
    }

    pub fn delete_user(&self, id: u64) -> Result<()> {
        let _writes = self.caches.lock_writes();
        if !self.store.exists_by_id(id).map_err(store_failure)? {
            return Err(user_not_found(id));
        }

        self.store.delete_by_id(id).map_err(store_failure)?;
        self.caches.apply(Mutation::Deleted { id });

        info!(id, "user deleted");
        Ok(())
    }

    pub fn cache_stats(&self) -> BTreeMap<&'static str, CacheStats> {
        self.caches.stats()
    }

    pub fn cleanup_expired(&self) -> usize {
        self.caches.cleanup_expired()
    }
}
