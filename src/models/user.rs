//! User records

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{FilterKey, Fingerprint};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Role {
    User,
    Admin,
    Agent,
}

impl Role {
    pub const ALL: [Role; 3] = [Self::User, Self::Admin, Self::Agent];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::Agent => "AGENT",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| AppError::Validation(format!("Invalid role: {}", raw)))
    }
}

impl TryFrom<String> for Role {
    type Error = AppError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The by-role listing is the user service's filtered query.
impl Fingerprint for Role {
    fn fingerprint(&self) -> String {
        FilterKey::new("user-role").code(Some(self.as_str())).finish()
    }
}

// == User ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Assigned by the store on first save
    pub id: Option<u64>,
    /// Unique natural key
    pub username: String,
    /// Unique
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
