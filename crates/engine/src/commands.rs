//! Command structs for the engine operations.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{DonationStatus, ProgramStatus, UserRole, VolunteerStatus};

#[derive(Clone, Debug)]
pub struct ProgramNewCmd {
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub manager: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target_minor: i64,
    pub status: ProgramStatus,
    pub is_featured: bool,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ProgramUpdateCmd {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub manager: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub target_minor: Option<i64>,
    pub status: Option<ProgramStatus>,
    pub is_featured: Option<bool>,
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default)]
pub struct ProgramListFilter {
    pub status: Option<ProgramStatus>,
    pub category: Option<String>,
    pub featured_only: bool,
}

#[derive(Clone, Debug)]
pub struct DonationNewCmd {
    pub program_id: Uuid,
    pub donor_id: String,
    pub donor_name: String,
    pub amount_minor: i64,
    pub date: NaiveDate,
    pub status: DonationStatus,
    pub payment_method: String,
    pub is_anonymous: bool,
    pub note: Option<String>,
    /// Optional key for safely retrying the same create request. Without it
    /// a duplicate submit creates a second donation and double-counts.
    pub idempotency_key: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct DonationUpdateCmd {
    pub amount_minor: Option<i64>,
    pub date: Option<NaiveDate>,
    pub status: Option<DonationStatus>,
    pub payment_method: Option<String>,
    pub note: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct DonationListFilter {
    pub program_id: Option<Uuid>,
    pub donor_id: Option<String>,
    pub status: Option<DonationStatus>,
    pub limit: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct VolunteerNewCmd {
    pub program_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub joined_date: NaiveDate,
    pub status: VolunteerStatus,
}

#[derive(Clone, Debug, Default)]
pub struct VolunteerUpdateCmd {
    pub program_id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub joined_date: Option<NaiveDate>,
    pub status: Option<VolunteerStatus>,
}

#[derive(Clone, Debug, Default)]
pub struct VolunteerListFilter {
    pub program_id: Option<Uuid>,
    pub status: Option<VolunteerStatus>,
}

#[derive(Clone, Debug)]
pub struct RegisterProfileCmd {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Clone, Debug, Default)]
pub struct UserUpdateCmd {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Clone, Debug)]
pub struct OnboardingCmd {
    pub interests: Vec<String>,
    pub preferred_contact: String,
    pub how_heard: String,
    pub donation_frequency: String,
}
