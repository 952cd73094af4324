//! Donation primitives.
//!
//! A `Donation` is a single monetary contribution linked to a program and a
//! donor. The donor's avatar is denormalized onto the document at write time
//! (best-effort). `created_at` is server-assigned.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

pub const COLLECTION: &str = "donations";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Completed,
    Pending,
    Failed,
}

impl DonationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for DonationStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            other => Err(EngineError::InvalidField(format!(
                "invalid donation status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: Uuid,
    pub program_id: Uuid,
    pub donor_id: String,
    pub donor_name: String,
    pub donor_avatar: Option<String>,
    pub amount_minor: i64,
    pub date: NaiveDate,
    pub status: DonationStatus,
    pub payment_method: String,
    pub is_anonymous: bool,
    pub note: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        program_id: Uuid,
        donor_id: String,
        donor_name: String,
        amount_minor: i64,
        date: NaiveDate,
        status: DonationStatus,
        payment_method: String,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            program_id,
            donor_id,
            donor_name,
            donor_avatar: None,
            amount_minor,
            date,
            status,
            payment_method,
            is_anonymous: false,
            note: None,
            idempotency_key: None,
            created_at: Utc::now(),
        })
    }
}
