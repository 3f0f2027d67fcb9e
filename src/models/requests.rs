//! Request DTOs for the record service API
//!
//! Defines the structure of incoming HTTP request bodies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{AutoPolicyType, PolicyStatus, Role};

/// External representation of an auto policy, used for both requests and responses.
///
/// Required-on-write fields are optional here so a missing field surfaces as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDto {
    pub id: Option<u64>,
    pub policy_number: Option<String>,
    pub status: Option<PolicyStatus>,
    pub policy_type: Option<AutoPolicyType>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_year: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub premium_amount: Option<f64>,
    pub user_id: Option<u64>,
}

impl PolicyDto {
    /// Validates the fields a policy cannot be stored without.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match self.policy_number.as_deref().map(str::trim) {
            None | Some("") => return Some("Policy number is required".to_string()),
            Some(_) => {}
        }
        if self.status.is_none() {
            return Some("Status is required".to_string());
        }
        if self.policy_type.is_none() {
            return Some("Policy type is required".to_string());
        }
        if self.user_id.is_none() {
            return Some("User id is required".to_string());
        }
        if self.premium_amount.is_some_and(|p| !p.is_finite() || p < 0.0) {
            return Some("Premium amount must be a non-negative number".to_string());
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Some("Start date must not be after end date".to_string());
            }
        }
        None
    }
}

/// Request body for creating or updating a user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl UserRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.username.trim().is_empty() {
            return Some("Username is required".to_string());
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Some("Email is required".to_string());
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => return Some("Valid email is required".to_string()),
        }
        if self.role.is_none() {
            return Some("Role cannot be null".to_string());
        }
        None
    }
}
