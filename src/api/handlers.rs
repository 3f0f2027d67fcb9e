//! API Handlers
//!
//! HTTP request handlers for the policy, user and cache admin endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::cache::CachePolicy;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    CacheStatsResponse, HealthResponse, MessageResponse, PolicyDto, PolicyFilter,
    PolicyFilterParams, RegionStatsResponse, UserRequest, UserResponse,
};
use crate::service::{PolicyService, UserService};
use crate::store::{MemoryPolicyStore, MemoryUserStore, PolicyStore, UserStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub policies: Arc<PolicyService>,
    pub users: Arc<UserService>,
}

impl AppState {
    pub fn new(policies: PolicyService, users: UserService) -> Self {
        Self {
            policies: Arc::new(policies),
            users: Arc::new(users),
        }
    }

    /// Builds both services over the given stores with regions sized from `config`.
    pub fn with_stores(
        config: &Config,
        policy_store: Arc<dyn PolicyStore>,
        user_store: Arc<dyn UserStore>,
    ) -> Self {
        let cache_policy = CachePolicy::from_config(config);
        Self::new(
            PolicyService::new(policy_store, &cache_policy),
            UserService::new(user_store, &cache_policy),
        )
    }

    /// Creates a new AppState from configuration, backed by in-memory stores.
    pub fn from_config(config: &Config) -> Self {
        Self::with_stores(
            config,
            Arc::new(MemoryPolicyStore::new()),
            Arc::new(MemoryUserStore::new()),
        )
    }

    /// Sweeps expired entries from every region of both services.
    pub fn cleanup_expired(&self) -> usize {
        self.policies.cleanup_expired() + self.users.cleanup_expired()
    }
}

/// Runs a service call on the blocking pool; store calls may block on I/O.
async fn blocking<T, F>(call: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|err| AppError::Internal(format!("service task failed: {}", err)))?
}

fn created_at<T: Serialize>(location: String, body: T) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(body),
    )
}

// == Policies ==

/// Handler for POST /api/v1/policies
pub async fn create_policy_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PolicyDto>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(dto) = payload?;
    let created = blocking(move || state.policies.create_policy(dto)).await?;
    let location = format!("/api/v1/policies/{}", created.id.unwrap_or_default());
    Ok(created_at(location, created))
}

/// Handler for POST /api/v1/policies/batch
pub async fn create_policies_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Vec<PolicyDto>>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<PolicyDto>>)> {
    let Json(dtos) = payload?;
    let created = blocking(move || state.policies.create_policies(dtos)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for GET /api/v1/policies
pub async fn list_policies_handler(State(state): State<AppState>) -> Result<Json<Vec<PolicyDto>>> {
    Ok(Json(blocking(move || state.policies.get_all_policies()).await?))
}

/// Handler for GET /api/v1/policies/filter
///
/// Unknown status or type codes and inverted ranges are rejected with 400.
pub async fn filter_policies_handler(
    State(state): State<AppState>,
    Query(params): Query<PolicyFilterParams>,
) -> Result<Json<Vec<PolicyDto>>> {
    let filter = PolicyFilter::try_from(params)?;
    Ok(Json(
        blocking(move || state.policies.get_filtered_policies(&filter)).await?,
    ))
}

/// Handler for GET /api/v1/policies/:id
pub async fn get_policy_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<PolicyDto>> {
    Ok(Json(blocking(move || state.policies.get_policy_by_id(id)).await?))
}

/// Handler for GET /api/v1/policies/policyNumber/:number
pub async fn get_policy_by_number_handler(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<PolicyDto>> {
    Ok(Json(
        blocking(move || state.policies.get_policy_by_number(&number)).await?,
    ))
}

/// Handler for PUT /api/v1/policies/:id
pub async fn update_policy_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: std::result::Result<Json<PolicyDto>, JsonRejection>,
) -> Result<Json<PolicyDto>> {
    let Json(dto) = payload?;
    Ok(Json(
        blocking(move || state.policies.update_policy(id, dto)).await?,
    ))
}

/// Handler for DELETE /api/v1/policies/:id
pub async fn delete_policy_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    blocking(move || state.policies.delete_policy(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// == Users ==

/// Handler for POST /api/v1/users
pub async fn create_user_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UserRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) = payload?;
    let created = blocking(move || state.users.create_user(request)).await?;
    let location = format!("/api/v1/users/{}", created.id);
    Ok(created_at(location, created))
}

pub async fn list_users_handler(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>> {
    Ok(Json(blocking(move || state.users.get_all_users()).await?))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<UserResponse>> {
    Ok(Json(blocking(move || state.users.get_user_by_id(id)).await?))
}

pub async fn get_user_by_username_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>> {
    Ok(Json(
        blocking(move || state.users.get_user_by_username(&username)).await?,
    ))
}

pub async fn users_by_role_handler(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Json<Vec<UserResponse>>> {
    Ok(Json(
        blocking(move || state.users.get_users_by_role(&role)).await?,
    ))
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: std::result::Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>> {
    let Json(request) = payload?;
    Ok(Json(
        blocking(move || state.users.update_user(id, request)).await?,
    ))
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    blocking(move || state.users.delete_user(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// == Cache admin ==

/// Handler for GET /api/v1/cache/stats
///
/// Returns per-region statistics for every policy and user region.
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let response: CacheStatsResponse = state
        .policies
        .cache_stats()
        .into_iter()
        .chain(state.users.cache_stats())
        .map(|(name, stats)| (name.to_string(), RegionStatsResponse::from(&stats)))
        .collect();
    Json(response)
}

/// Handler for DELETE /api/v1/cache/filtered
pub async fn clear_filtered_cache_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.policies.clear_filtered_cache();
    Json(MessageResponse::new("Filtered policy cache cleared"))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
