//! Error types for the record service
//!
//! Provides unified error handling using thiserror.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::store::StoreError;

// == App Error Enum ==
/// Unified error type for the record service.
///
/// The cache layer passes every variant through unchanged; none of them is
/// ever stored as a cached value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Point lookup target absent
    #[error("{0}")]
    NotFound(String),

    /// Natural key already taken
    #[error("{0}")]
    DuplicateKey(String),

    /// Malformed request or filter, rejected before any cache access
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Backing store failure, never retried here
    #[error("Store unavailable: {0}")]
    TransientStore(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Duplicate(msg) => AppError::DuplicateKey(msg),
            StoreError::Unavailable(msg) => AppError::TransientStore(msg),
        }
    }
}

/// Malformed or ill-typed JSON bodies (unknown enum codes included) are
/// validation failures.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateKey(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::TransientStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the record service.
pub type Result<T> = std::result::Result<T, AppError>;
