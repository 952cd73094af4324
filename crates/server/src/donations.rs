//! Donation API endpoints

use api_types::donation::{
    DonationCreated, DonationListQuery, DonationListResponse, DonationNew,
    DonationStatus as ApiStatus, DonationUpdate, DonationView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use engine::{
    Donation, DonationListFilter, DonationNewCmd, DonationStatus, DonationUpdateCmd, UserRole,
};

use crate::{
    ServerError,
    server::{AuthUser, ServerState, require_admin},
};

fn map_status(status: DonationStatus) -> ApiStatus {
    match status {
        DonationStatus::Completed => ApiStatus::Completed,
        DonationStatus::Pending => ApiStatus::Pending,
        DonationStatus::Failed => ApiStatus::Failed,
    }
}

fn map_api_status(status: ApiStatus) -> DonationStatus {
    match status {
        ApiStatus::Completed => DonationStatus::Completed,
        ApiStatus::Pending => DonationStatus::Pending,
        ApiStatus::Failed => DonationStatus::Failed,
    }
}

fn view(donation: Donation) -> DonationView {
    DonationView {
        id: donation.id,
        program_id: donation.program_id,
        donor_id: donation.donor_id,
        donor_name: donation.donor_name,
        donor_avatar: donation.donor_avatar,
        amount_minor: donation.amount_minor,
        date: donation.date,
        status: map_status(donation.status),
        payment_method: donation.payment_method,
        is_anonymous: donation.is_anonymous,
        note: donation.note,
        created_at: donation.created_at.fixed_offset(),
    }
}

/// Donors create donations for themselves; the donor identity comes from
/// the session, never from the payload.
pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<DonationNew>,
) -> Result<(StatusCode, Json<DonationCreated>), ServerError> {
    let profile = state.engine.profile(&user.uid).await?;
    let id = state
        .engine
        .create_donation(DonationNewCmd {
            program_id: payload.program_id,
            donor_id: user.uid,
            donor_name: profile.name,
            amount_minor: payload.amount_minor,
            date: payload.date,
            status: map_api_status(payload.status),
            payment_method: payload.payment_method,
            is_anonymous: payload.is_anonymous.unwrap_or(false),
            note: payload.note,
            idempotency_key: payload.idempotency_key,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(DonationCreated { id })))
}

/// Admins see every donation; everyone else only their own.
pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<DonationListQuery>,
) -> Result<Json<DonationListResponse>, ServerError> {
    let donor_id = if user.role == UserRole::Admin {
        None
    } else {
        Some(user.uid.clone())
    };
    let donations = state
        .engine
        .list_donations(DonationListFilter {
            program_id: query.program_id,
            donor_id,
            status: query.status.map(map_api_status),
            limit: query.limit,
        })
        .await?;

    Ok(Json(DonationListResponse {
        donations: donations.into_iter().map(view).collect(),
    }))
}

pub async fn recent(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<DonationListQuery>,
) -> Result<Json<DonationListResponse>, ServerError> {
    require_admin(&user)?;
    let donations = state
        .engine
        .recent_donations(query.limit.unwrap_or(10))
        .await?;
    Ok(Json(DonationListResponse {
        donations: donations.into_iter().map(view).collect(),
    }))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DonationUpdate>,
) -> Result<StatusCode, ServerError> {
    require_admin(&user)?;
    state
        .engine
        .update_donation(
            id,
            DonationUpdateCmd {
                amount_minor: payload.amount_minor,
                date: payload.date,
                status: payload.status.map(map_api_status),
                payment_method: payload.payment_method,
                note: payload.note,
            },
        )
        .await?;

    Ok(StatusCode::OK)
}

pub async fn remove(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    require_admin(&user)?;
    state.engine.delete_donation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
