//! Policy records
//!
//! Shared policy fields live in [`PolicyCore`], which auto policies embed by
//! composition alongside their vehicle-specific extension fields.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// == Policy Status ==
/// Lifecycle state of a policy. Parsed from either its name or short code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum PolicyStatus {
    Active,
    Expired,
    Cancelled,
}

impl PolicyStatus {
    pub const ALL: [PolicyStatus; 3] = [Self::Active, Self::Expired, Self::Cancelled];

    /// Short storage code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Active => "ACT",
            Self::Expired => "EXP",
            Self::Cancelled => "CAN",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Case-insensitive lookup by code (`ACT`) or name (`ACTIVE`).
    pub fn from_code(raw: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|s| s.code().eq_ignore_ascii_case(raw) || s.name().eq_ignore_ascii_case(raw))
            .ok_or_else(|| AppError::Validation(format!("Invalid PolicyStatus: {}", raw)))
    }
}

impl TryFrom<String> for PolicyStatus {
    type Error = AppError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::from_code(&raw)
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// == Auto Policy Type ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum AutoPolicyType {
    Liability,
    Collision,
    Comprehensive,
}

impl AutoPolicyType {
    pub const ALL: [AutoPolicyType; 3] = [Self::Liability, Self::Collision, Self::Comprehensive];

    pub fn code(self) -> &'static str {
        match self {
            Self::Liability => "LIABILITY",
            Self::Collision => "COLLISION",
            Self::Comprehensive => "COMPREHENSIVE",
        }
    }

    pub fn from_code(raw: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(raw))
            .ok_or_else(|| AppError::Validation(format!("Invalid AutoPolicyType code: {}", raw)))
    }
}

impl TryFrom<String> for AutoPolicyType {
    type Error = AppError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::from_code(&raw)
    }
}

impl fmt::Display for AutoPolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// == Policy Core ==
/// Fields every policy kind carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCore {
    /// Surrogate id, assigned by the store on first save
    pub id: Option<u64>,
    /// Unique natural key
    pub policy_number: String,
    pub user_id: u64,
    pub status: PolicyStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub premium_amount: Option<f64>,
}

// == Auto Policy ==
/// An auto insurance policy: the shared core plus vehicle and holder details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoPolicy {
    #[serde(flatten)]
    pub core: PolicyCore,
    pub policy_type: AutoPolicyType,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_year: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl AutoPolicy {
    pub fn id(&self) -> Option<u64> {
        self.core.id
    }

    pub fn policy_number(&self) -> &str {
        &self.core.policy_number
    }
}
