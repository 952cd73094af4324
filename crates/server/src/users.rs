//! User profile API endpoints

use api_types::user::{
    MeResponse, OnboardingRequest, UserListResponse, UserRole as ApiRole, UserUpdate, UserView,
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{OnboardingCmd, UserProfile, UserRole, UserUpdateCmd};

use crate::{
    ServerError,
    server::{AuthUser, ServerState, require_admin, sections_for_role},
};

pub(crate) fn map_role(role: UserRole) -> ApiRole {
    match role {
        UserRole::Admin => ApiRole::Admin,
        UserRole::Donor => ApiRole::Donor,
        UserRole::Volunteer => ApiRole::Volunteer,
    }
}

fn view(profile: UserProfile) -> UserView {
    UserView {
        id: profile.id,
        name: profile.name,
        email: profile.email,
        role: map_role(profile.role),
        avatar: profile.avatar,
        onboarding_completed: profile.onboarding_completed,
        created_at: profile.created_at.fixed_offset(),
    }
}

pub async fn me(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<MeResponse>, ServerError> {
    let profile = state.engine.profile(&user.uid).await?;
    let sections = sections_for_role(profile.role);
    Ok(Json(MeResponse {
        user: view(profile),
        sections,
    }))
}

pub async fn update_me(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<UserUpdate>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .update_profile(
            &user.uid,
            UserUpdateCmd {
                name: payload.name,
                avatar: payload.avatar,
            },
        )
        .await?;
    Ok(StatusCode::OK)
}

pub async fn onboarding(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<OnboardingRequest>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .complete_onboarding(
            &user.uid,
            OnboardingCmd {
                interests: payload.interests,
                preferred_contact: payload.preferred_contact,
                how_heard: payload.how_heard,
                donation_frequency: payload.donation_frequency,
            },
        )
        .await?;
    Ok(StatusCode::OK)
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<UserListResponse>, ServerError> {
    require_admin(&user)?;
    let users = state.engine.list_users().await?;
    Ok(Json(UserListResponse {
        users: users.into_iter().map(view).collect(),
    }))
}
