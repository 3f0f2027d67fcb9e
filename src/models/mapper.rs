//! Conversions between stored records and their external representation.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{AutoPolicy, PolicyCore, PolicyDto, User, UserRequest, UserResponse};

pub fn policy_to_dto(policy: &AutoPolicy) -> PolicyDto {
    let core = &policy.core;
    PolicyDto {
        id: core.id,
        policy_number: Some(core.policy_number.clone()),
        status: Some(core.status),
        policy_type: Some(policy.policy_type),
        vehicle_make: policy.vehicle_make.clone(),
        vehicle_model: policy.vehicle_model.clone(),
        vehicle_year: policy.vehicle_year.clone(),
        first_name: policy.first_name.clone(),
        last_name: policy.last_name.clone(),
        start_date: core.start_date,
        end_date: core.end_date,
        premium_amount: core.premium_amount,
        user_id: Some(core.user_id),
    }
}

/// Builds a storable record, rejecting DTOs that miss required fields.
pub fn dto_to_policy(dto: &PolicyDto) -> Result<AutoPolicy> {
    if let Some(msg) = dto.validate() {
        return Err(AppError::Validation(msg));
    }
    let missing = |field: &str| AppError::Validation(format!("{} is required", field));

    Ok(AutoPolicy {
        core: PolicyCore {
            id: dto.id,
            policy_number: dto
                .policy_number
                .as_deref()
                .map(str::trim)
                .map(str::to_string)
                .ok_or_else(|| missing("policyNumber"))?,
            user_id: dto.user_id.ok_or_else(|| missing("userId"))?,
            status: dto.status.ok_or_else(|| missing("status"))?,
            start_date: dto.start_date,
            end_date: dto.end_date,
            premium_amount: dto.premium_amount,
        },
        policy_type: dto.policy_type.ok_or_else(|| missing("policyType"))?,
        vehicle_make: dto.vehicle_make.clone(),
        vehicle_model: dto.vehicle_model.clone(),
        vehicle_year: dto.vehicle_year.clone(),
        first_name: dto.first_name.clone(),
        last_name: dto.last_name.clone(),
    })
}

pub fn user_to_response(user: &User) -> UserResponse {
    UserResponse {
        // records read back from a store always carry their id
        id: user.id.unwrap_or_default(),
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role,
        active: user.active,
        created_at: user.created_at,
    }
}

/// Builds a new, active user from a request.
pub fn request_to_user(request: &UserRequest, now: DateTime<Utc>) -> Result<User> {
    if let Some(msg) = request.validate() {
        return Err(AppError::Validation(msg));
    }
    Ok(User {
        id: None,
        username: request.username.trim().to_string(),
        email: request.email.trim().to_string(),
        role: request
            .role
            .ok_or_else(|| AppError::Validation("Role cannot be null".to_string()))?,
        active: true,
        created_at: now,
    })
}
