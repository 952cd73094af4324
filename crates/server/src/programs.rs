//! Program API endpoints

use api_types::program::{
    ProgramCreated, ProgramListQuery, ProgramListResponse, ProgramNew, ProgramRecomputed,
    ProgramStatus as ApiStatus, ProgramUpdate, ProgramView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use engine::{Program, ProgramListFilter, ProgramNewCmd, ProgramStatus, ProgramUpdateCmd};

use crate::{
    ServerError,
    server::{AuthUser, ServerState, require_admin},
};

fn map_status(status: ProgramStatus) -> ApiStatus {
    match status {
        ProgramStatus::Active => ApiStatus::Active,
        ProgramStatus::Draft => ApiStatus::Draft,
        ProgramStatus::Completed => ApiStatus::Completed,
    }
}

fn map_api_status(status: ApiStatus) -> ProgramStatus {
    match status {
        ApiStatus::Active => ProgramStatus::Active,
        ApiStatus::Draft => ProgramStatus::Draft,
        ApiStatus::Completed => ProgramStatus::Completed,
    }
}

fn view(program: Program) -> ProgramView {
    ProgramView {
        id: program.id,
        title: program.title,
        description: program.description,
        category: program.category,
        location: program.location,
        manager: program.manager,
        start_date: program.start_date,
        end_date: program.end_date,
        target_minor: program.target_minor,
        raised_minor: program.raised_minor,
        status: map_status(program.status),
        volunteers: program.volunteers,
        is_featured: program.is_featured,
        image_url: program.image_url,
        tags: program.tags,
        created_at: program.created_at.fixed_offset(),
        updated_at: program.updated_at.fixed_offset(),
    }
}

pub async fn list(
    Extension(_user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<ProgramListQuery>,
) -> Result<Json<ProgramListResponse>, ServerError> {
    let programs = state
        .engine
        .list_programs(ProgramListFilter {
            status: query.status.map(map_api_status),
            category: query.category,
            featured_only: query.featured.unwrap_or(false),
        })
        .await?;

    Ok(Json(ProgramListResponse {
        programs: programs.into_iter().map(view).collect(),
    }))
}

pub async fn get(
    Extension(_user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProgramView>, ServerError> {
    let program = state.engine.program(id).await?;
    Ok(Json(view(program)))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<ProgramNew>,
) -> Result<(StatusCode, Json<ProgramCreated>), ServerError> {
    require_admin(&user)?;
    let id = state
        .engine
        .create_program(ProgramNewCmd {
            title: payload.title,
            description: payload.description,
            category: payload.category,
            location: payload.location,
            manager: payload.manager,
            start_date: payload.start_date,
            end_date: payload.end_date,
            target_minor: payload.target_minor,
            status: map_api_status(payload.status),
            is_featured: payload.is_featured.unwrap_or(false),
            image_url: payload.image_url,
            tags: payload.tags.unwrap_or_default(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ProgramCreated { id })))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProgramUpdate>,
) -> Result<StatusCode, ServerError> {
    require_admin(&user)?;
    state
        .engine
        .update_program(
            id,
            ProgramUpdateCmd {
                title: payload.title,
                description: payload.description,
                category: payload.category,
                location: payload.location,
                manager: payload.manager,
                start_date: payload.start_date,
                end_date: payload.end_date,
                target_minor: payload.target_minor,
                status: payload.status.map(map_api_status),
                is_featured: payload.is_featured,
                image_url: payload.image_url,
                tags: payload.tags,
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
    state.engine.delete_program(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Overwrite the raised total with the recomputed sum of completed
/// donations (drift repair).
pub async fn recompute(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProgramRecomputed>, ServerError> {
    require_admin(&user)?;
    let raised_minor = state.engine.recompute_raised(id).await?;
    Ok(Json(ProgramRecomputed { raised_minor }))
}
