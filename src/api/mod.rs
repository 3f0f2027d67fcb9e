//! API Module
//!
//! HTTP handlers and routing for the record service REST API.
//!
//! # Endpoints
//! - `/api/v1/policies` - Policy CRUD, batch create, filter search
//! - `/api/v1/users` - User CRUD, lookup by username and role
//! - `GET /api/v1/cache/stats` - Per-region cache statistics
//! - `DELETE /api/v1/cache/filtered` - Drop cached filter results
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
