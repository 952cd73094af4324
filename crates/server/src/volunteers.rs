//! Volunteer API endpoints

use api_types::volunteer::{
    VolunteerCreated, VolunteerListQuery, VolunteerListResponse, VolunteerNew,
    VolunteerStatus as ApiStatus, VolunteerUpdate, VolunteerView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use engine::{Volunteer, VolunteerListFilter, VolunteerNewCmd, VolunteerStatus, VolunteerUpdateCmd};

use crate::{
    ServerError,
    server::{AuthUser, ServerState, require_admin},
};

fn map_status(status: VolunteerStatus) -> ApiStatus {
    match status {
        VolunteerStatus::Active => ApiStatus::Active,
        VolunteerStatus::Inactive => ApiStatus::Inactive,
    }
}

fn map_api_status(status: ApiStatus) -> VolunteerStatus {
    match status {
        ApiStatus::Active => VolunteerStatus::Active,
        ApiStatus::Inactive => VolunteerStatus::Inactive,
    }
}

fn view(volunteer: Volunteer) -> VolunteerView {
    VolunteerView {
        id: volunteer.id,
        program_id: volunteer.program_id,
        name: volunteer.name,
        email: volunteer.email,
        phone: volunteer.phone,
        role: volunteer.role,
        joined_date: volunteer.joined_date,
        status: map_status(volunteer.status),
    }
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<VolunteerListQuery>,
) -> Result<Json<VolunteerListResponse>, ServerError> {
    require_admin(&user)?;
    let volunteers = state
        .engine
        .list_volunteers(VolunteerListFilter {
            program_id: query.program_id,
            status: query.status.map(map_api_status),
        })
        .await?;

    Ok(Json(VolunteerListResponse {
        volunteers: volunteers.into_iter().map(view).collect(),
    }))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<VolunteerNew>,
) -> Result<(StatusCode, Json<VolunteerCreated>), ServerError> {
    require_admin(&user)?;
    let id = state
        .engine
        .create_volunteer(VolunteerNewCmd {
            program_id: payload.program_id,
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
            role: payload.role,
            joined_date: payload.joined_date,
            status: map_api_status(payload.status),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(VolunteerCreated { id })))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VolunteerUpdate>,
) -> Result<StatusCode, ServerError> {
    require_admin(&user)?;
    state
        .engine
        .update_volunteer(
            id,
            VolunteerUpdateCmd {
                program_id: payload.program_id,
                name: payload.name,
                email: payload.email,
                phone: payload.phone,
                role: payload.role,
                joined_date: payload.joined_date,
                status: payload.status.map(map_api_status),
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
    state.engine.delete_volunteer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
