//! Response DTOs for the record service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::models::Role;

/// External representation of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-region statistics for the stats endpoint (GET /api/v1/cache/stats).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStatsResponse {
    pub hit_count: u64,
    pub miss_count: u64,
    pub load_success_count: u64,
    pub load_failure_count: u64,
    /// Nanoseconds
    pub total_load_time: u64,
    pub eviction_count: u64,
    pub size: usize,
    pub hit_rate: f64,
}

impl From<&CacheStats> for RegionStatsResponse {
    fn from(stats: &CacheStats) -> Self {
        Self {
            hit_count: stats.hits,
            miss_count: stats.misses,
            load_success_count: stats.load_successes,
            load_failure_count: stats.load_failures,
            total_load_time: stats.total_load_time_ns,
            eviction_count: stats.evictions,
            size: stats.total_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Stats keyed by region name.
pub type CacheStatsResponse = BTreeMap<String, RegionStatsResponse>;

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Plain acknowledgement for admin operations.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}
