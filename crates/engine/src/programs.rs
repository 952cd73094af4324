//! Program primitives.
//!
//! A `Program` is a fundraising/volunteer campaign with a funding target and
//! two derived fields: `raised_minor` (running donation total, maintained by
//! the donation ops) and `volunteers` (active-volunteer count, recomputed by
//! the volunteer ops).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

pub const COLLECTION: &str = "programs";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramStatus {
    Active,
    Draft,
    Completed,
}

impl ProgramStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Draft => "draft",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for ProgramStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "draft" => Ok(Self::Draft),
            "completed" => Ok(Self::Completed),
            other => Err(EngineError::InvalidField(format!(
                "invalid program status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub manager: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target_minor: i64,
    pub raised_minor: i64,
    pub status: ProgramStatus,
    pub volunteers: u64,
    pub is_featured: bool,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Program {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: String,
        description: String,
        category: String,
        location: String,
        manager: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        target_minor: i64,
        status: ProgramStatus,
    ) -> ResultEngine<Self> {
        if target_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "target_minor must be > 0".to_string(),
            ));
        }
        if start_date > end_date {
            return Err(EngineError::InvalidField(
                "start_date must not be after end_date".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            description,
            category,
            location,
            manager,
            start_date,
            end_date,
            target_minor,
            raised_minor: 0,
            status,
            volunteers: 0,
            is_featured: false,
            image_url: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }
}
