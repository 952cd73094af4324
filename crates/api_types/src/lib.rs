use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod program {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ProgramStatus {
        Active,
        Draft,
        Completed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProgramNew {
        pub title: String,
        pub description: String,
        pub category: String,
        pub location: String,
        pub manager: String,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        /// Funding goal in minor units (cents). Must be > 0.
        pub target_minor: i64,
        pub status: ProgramStatus,
        pub is_featured: Option<bool>,
        pub image_url: Option<String>,
        pub tags: Option<Vec<String>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProgramUpdate {
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

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProgramView {
        pub id: Uuid,
        pub title: String,
        pub description: String,
        pub category: String,
        pub location: String,
        pub manager: String,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        pub target_minor: i64,
        /// Derived running total of donations (minor units).
        pub raised_minor: i64,
        pub status: ProgramStatus,
        /// Derived count of active volunteers.
        pub volunteers: u64,
        pub is_featured: bool,
        pub image_url: Option<String>,
        pub tags: Vec<String>,
        /// RFC3339 timestamp, including timezone offset.
        pub created_at: DateTime<FixedOffset>,
        pub updated_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProgramCreated {
        pub id: Uuid,
    }

    /// Result of a raised-total recompute.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProgramRecomputed {
        pub raised_minor: i64,
    }

    /// Query-string filters for listing programs.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProgramListQuery {
        pub status: Option<ProgramStatus>,
        pub category: Option<String>,
        pub featured: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProgramListResponse {
        pub programs: Vec<ProgramView>,
    }
}

pub mod donation {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum DonationStatus {
        Completed,
        Pending,
        Failed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DonationNew {
        pub program_id: Uuid,
        /// Must be > 0 (minor units).
        pub amount_minor: i64,
        pub date: NaiveDate,
        pub status: DonationStatus,
        pub payment_method: String,
        pub is_anonymous: Option<bool>,
        pub note: Option<String>,
        /// Optional idempotency key for safely retrying the same create request.
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct DonationUpdate {
        pub amount_minor: Option<i64>,
        pub date: Option<NaiveDate>,
        pub status: Option<DonationStatus>,
        pub payment_method: Option<String>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DonationView {
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
        /// RFC3339 timestamp, including timezone offset.
        pub created_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DonationCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct DonationListQuery {
        pub program_id: Option<Uuid>,
        pub status: Option<DonationStatus>,
        pub limit: Option<usize>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DonationListResponse {
        pub donations: Vec<DonationView>,
    }
}

pub mod volunteer {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum VolunteerStatus {
        Active,
        Inactive,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VolunteerNew {
        pub program_id: Uuid,
        pub name: String,
        pub email: String,
        pub phone: Option<String>,
        pub role: String,
        pub joined_date: NaiveDate,
        pub status: VolunteerStatus,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct VolunteerUpdate {
        pub program_id: Option<Uuid>,
        pub name: Option<String>,
        pub email: Option<String>,
        pub phone: Option<String>,
        pub role: Option<String>,
        pub joined_date: Option<NaiveDate>,
        pub status: Option<VolunteerStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VolunteerView {
        pub id: Uuid,
        pub program_id: Uuid,
        pub name: String,
        pub email: String,
        pub phone: Option<String>,
        pub role: String,
        pub joined_date: NaiveDate,
        pub status: VolunteerStatus,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VolunteerCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct VolunteerListQuery {
        pub program_id: Option<Uuid>,
        pub status: Option<VolunteerStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VolunteerListResponse {
        pub volunteers: Vec<VolunteerView>,
    }
}

pub mod user {
    use super::*;

    /// Role of an account.
    ///
    /// The server treats roles as:
    /// - `admin`: full access to programs, volunteers, users and reports.
    /// - `donor`: can donate and see their own donations.
    /// - `volunteer`: donor access plus volunteer self-service.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum UserRole {
        Admin,
        Donor,
        Volunteer,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: String,
        pub name: String,
        pub email: String,
        pub role: UserRole,
        pub avatar: Option<String>,
        pub onboarding_completed: bool,
        /// RFC3339 timestamp, including timezone offset.
        pub created_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserUpdate {
        pub name: Option<String>,
        pub avatar: Option<String>,
    }

    /// Onboarding survey answers.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct OnboardingRequest {
        pub interests: Vec<String>,
        pub preferred_contact: String,
        pub how_heard: String,
        pub donation_frequency: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MeResponse {
        pub user: UserView,
        /// API sections visible to this role.
        pub sections: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserListResponse {
        pub users: Vec<UserView>,
    }
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CheckEmailRequest {
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CheckEmailResponse {
        pub available: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SendOtpRequest {
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VerifyOtpRequest {
        pub email: String,
        pub code: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RegisterRequest {
        pub email: String,
        pub password: String,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SignInRequest {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoogleSignInRequest {
        /// Provider-issued ID token.
        pub id_token: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ResetPasswordRequest {
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionResponse {
        pub uid: String,
        pub token: String,
        pub role: super::user::UserRole,
    }
}

pub mod stats {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorySlice {
        pub category: String,
        pub raised_minor: i64,
        /// Share of the total raised, in percent (0.0 when nothing raised).
        pub share_pct: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DashboardSummary {
        pub total_raised_minor: i64,
        pub donation_count: u64,
        pub active_programs: u64,
        pub active_volunteers: u64,
        pub by_category: Vec<CategorySlice>,
    }
}

pub mod report {
    use super::*;

    /// Date window for reports, anchored on "now" with fixed day offsets.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub enum ReportRange {
        #[serde(rename = "last7days")]
        Last7Days,
        #[default]
        #[serde(rename = "last30days")]
        Last30Days,
        #[serde(rename = "last90days")]
        Last90Days,
        #[serde(rename = "thisYear")]
        ThisYear,
        #[serde(rename = "all")]
        All,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ReportFormat {
        #[default]
        Xlsx,
        Csv,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ReportQuery {
        pub range: Option<ReportRange>,
        pub format: Option<ReportFormat>,
    }
}
