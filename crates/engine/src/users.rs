//! User profile primitives.
//!
//! The profile document complements the identity provider's account record:
//! the provider owns credentials, the `users` collection owns the role and
//! the onboarding survey. `id` is the provider-issued uid.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EngineError;

pub const COLLECTION: &str = "users";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Donor,
    Volunteer,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Donor => "donor",
            Self::Volunteer => "volunteer",
        }
    }
}

impl TryFrom<&str> for UserRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "donor" => Ok(Self::Donor),
            "volunteer" => Ok(Self::Volunteer),
            other => Err(EngineError::InvalidField(format!("invalid role: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub onboarding_completed: bool,
    pub interests: Vec<String>,
    pub preferred_contact: Option<String>,
    pub how_heard: Option<String>,
    pub donation_frequency: Option<String>,
}

impl UserProfile {
    pub fn new(id: String, name: String, email: String, role: UserRole) -> Self {
        Self {
            id,
            name,
            email,
            role,
            avatar: None,
            created_at: Utc::now(),
            onboarding_completed: false,
            interests: Vec::new(),
            preferred_contact: None,
            how_heard: None,
            donation_frequency: None,
        }
    }
}
