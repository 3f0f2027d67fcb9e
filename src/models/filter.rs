//! Policy search filters
//!
//! [`PolicyFilterParams`] is the raw query string; [`PolicyFilter`] is the
//! validated, typed descriptor that is fingerprinted for the filter cache and
//! evaluated by the store.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::cache::{FilterKey, Fingerprint};
use crate::error::{AppError, Result};
use crate::models::{AutoPolicy, AutoPolicyType, PolicyStatus};

/// Raw filter parameters as they arrive on `GET /api/v1/policies/filter`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyFilterParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub policy_type: Option<String>,
    pub vehicle_make: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub min_premium: Option<f64>,
    pub max_premium: Option<f64>,
    pub user_id: Option<u64>,
}

// == Policy Filter ==
/// A validated combination of optional predicates. Every field left `None`
/// places no constraint on the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyFilter {
    /// Inclusive lower bound on the policy start date
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the policy end date
    pub end_date: Option<NaiveDate>,
    pub status: Option<PolicyStatus>,
    pub policy_type: Option<AutoPolicyType>,
    /// Case-insensitive substring
    pub vehicle_make: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub min_premium: Option<f64>,
    pub max_premium: Option<f64>,
    pub user_id: Option<u64>,
}

impl TryFrom<PolicyFilterParams> for PolicyFilter {
    type Error = AppError;

    fn try_from(params: PolicyFilterParams) -> Result<Self> {
        let filter = PolicyFilter {
            start_date: params.start_date,
            end_date: params.end_date,
            status: params
                .status
                .as_deref()
                .map(PolicyStatus::from_code)
                .transpose()?,
            policy_type: params
                .policy_type
                .as_deref()
                .map(AutoPolicyType::from_code)
                .transpose()?,
            vehicle_make: params.vehicle_make,
            first_name: params.first_name,
            last_name: params.last_name,
            min_premium: params.min_premium,
            max_premium: params.max_premium,
            user_id: params.user_id,
        };
        filter.validate()?;
        Ok(filter)
    }
}

impl PolicyFilter {
    // == Validate ==
    /// Rejects combinations that cannot describe a meaningful query.
    pub fn validate(&self) -> Result<()> {
        for (name, bound) in [("minPremium", self.min_premium), ("maxPremium", self.max_premium)] {
            if bound.is_some_and(|v| !v.is_finite()) {
                return Err(AppError::Validation(format!("{} must be a finite number", name)));
            }
        }
        if let (Some(min), Some(max)) = (self.min_premium, self.max_premium) {
            if min > max {
                return Err(AppError::Validation(
                    "minPremium must not exceed maxPremium".to_string(),
                ));
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AppError::Validation(
                    "startDate must not be after endDate".to_string(),
                ));
            }
        }
        Ok(())
    }

    // == Matches ==
    /// Evaluates the filter against one policy.
    ///
    /// Range bounds are inclusive, text fields are case-insensitive substring
    /// matches (an empty needle matches everything) and the rest are equality.
    /// A bound on a field the policy leaves empty never matches.
    pub fn matches(&self, policy: &AutoPolicy) -> bool {
        let core = &policy.core;

        let start_ok = match self.start_date {
            Some(bound) => core.start_date.is_some_and(|d| d >= bound),
            None => true,
        };
        let end_ok = match self.end_date {
            Some(bound) => core.end_date.is_some_and(|d| d <= bound),
            None => true,
        };
        let min_ok = match self.min_premium {
            Some(bound) => core.premium_amount.is_some_and(|p| p >= bound),
            None => true,
        };
        let max_ok = match self.max_premium {
            Some(bound) => core.premium_amount.is_some_and(|p| p <= bound),
            None => true,
        };

        start_ok
            && end_ok
            && min_ok
            && max_ok
            && self.status.map_or(true, |s| core.status == s)
            && self.policy_type.map_or(true, |t| policy.policy_type == t)
            && self.user_id.map_or(true, |u| core.user_id == u)
            && contains_ignore_case(policy.vehicle_make.as_deref(), self.vehicle_make.as_deref())
            && contains_ignore_case(policy.first_name.as_deref(), self.first_name.as_deref())
            && contains_ignore_case(policy.last_name.as_deref(), self.last_name.as_deref())
    }
}

fn contains_ignore_case(haystack: Option<&str>, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) if needle.is_empty() => true,
        Some(needle) => haystack
            .is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase())),
    }
}

impl Fingerprint for PolicyFilter {
    /// Field order is fixed; text is kept with its original casing even though
    /// matching ignores case.
    fn fingerprint(&self) -> String {
        FilterKey::new("policy-filter")
            .date(self.start_date)
            .date(self.end_date)
            .code(self.status.map(PolicyStatus::code))
            .code(self.policy_type.map(AutoPolicyType::code))
            .text(self.vehicle_make.as_deref())
            .text(self.first_name.as_deref())
            .text(self.last_name.as_deref())
            .number(self.min_premium)
            .number(self.max_premium)
            .id(self.user_id)
            .finish()
    }
}
