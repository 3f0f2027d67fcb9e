//! API Routes
//!
//! Configures the Axum router with the policy, user and cache admin endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, clear_filtered_cache_handler, create_policies_handler,
    create_policy_handler, create_user_handler, delete_policy_handler, delete_user_handler,
    filter_policies_handler, get_policy_by_number_handler, get_policy_handler,
    get_user_by_username_handler, get_user_handler, health_handler, list_policies_handler,
    list_users_handler, update_policy_handler, update_user_handler, users_by_role_handler,
    AppState,
};

fn policy_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_policy_handler).get(list_policies_handler))
        .route("/batch", post(create_policies_handler))
        .route("/filter", get(filter_policies_handler))
        .route("/policyNumber/:number", get(get_policy_by_number_handler))
        .route(
            "/:id",
            get(get_policy_handler)
                .put(update_policy_handler)
                .delete(delete_policy_handler),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user_handler).get(list_users_handler))
        .route("/username/:username", get(get_user_by_username_handler))
        .route("/role/:role", get(users_by_role_handler))
        .route(
            "/:id",
            get(get_user_handler)
                .put(update_user_handler)
                .delete(delete_user_handler),
        )
}

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1/policies", policy_routes())
        .nest("/api/v1/users", user_routes())
        .route("/api/v1/cache/stats", get(cache_stats_handler))
        .route("/api/v1/cache/filtered", delete(clear_filtered_cache_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
