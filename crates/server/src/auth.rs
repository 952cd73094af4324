//! Registration and session endpoints.
//!
//! Account creation is gated by a one-time-code email handshake:
//! check-email → send-otp → verify-otp → register. Sessions are opaque
//! provider tokens, passed back as bearer tokens.

use api_types::auth::{
    CheckEmailRequest, CheckEmailResponse, GoogleSignInRequest, RegisterRequest,
    ResetPasswordRequest, SendOtpRequest, SessionResponse, SignInRequest, VerifyOtpRequest,
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use engine::{IdentityError, IdentityProvider, RegisterProfileCmd, UserRole};

use crate::mailer::Mailer;
use crate::users::map_role;
use crate::{ServerError, server::ServerState};

fn require_email(email: &str) -> Result<String, ServerError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ServerError::Generic("a valid email is required".to_string()));
    }
    Ok(email)
}

pub async fn check_email(
    State(state): State<ServerState>,
    Json(payload): Json<CheckEmailRequest>,
) -> Result<Json<CheckEmailResponse>, ServerError> {
    let email = require_email(&payload.email)?;
    let exists = state.identity.email_exists(&email).await?;
    Ok(Json(CheckEmailResponse { available: !exists }))
}

pub async fn send_otp(
    State(state): State<ServerState>,
    Json(payload): Json<SendOtpRequest>,
) -> Result<StatusCode, ServerError> {
    let email = require_email(&payload.email)?;
    let code = state.otp.issue(&email, Utc::now());

    let body = format!(
        "Your verification code is {code}. It expires in 10 minutes.\n\n\
         If you did not request this, you can ignore this message."
    );
    if let Err(err) = state.mailer.send(&email, "Your verification code", &body).await {
        tracing::error!(%email, "failed to send verification code: {err}");
        return Err(ServerError::Generic(
            "failed to send verification email".to_string(),
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn verify_otp(
    State(state): State<ServerState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<StatusCode, ServerError> {
    let email = require_email(&payload.email)?;
    if state.otp.verify(&email, payload.code.trim(), Utc::now()) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::Generic(
            "invalid or expired verification code".to_string(),
        ))
    }
}

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ServerError> {
    let email = require_email(&payload.email)?;
    if !state.otp.take_verified(&email, Utc::now()) {
        return Err(ServerError::Generic(
            "email is not verified yet".to_string(),
        ));
    }

    let session = state.identity.sign_up(&email, &payload.password).await?;
    state
        .engine
        .register_profile(RegisterProfileCmd {
            uid: session.uid.clone(),
            name: payload.name,
            email,
            role: UserRole::Donor,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            uid: session.uid,
            token: session.token,
            role: map_role(UserRole::Donor),
        }),
    ))
}

pub async fn sign_in(
    State(state): State<ServerState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, ServerError> {
    let email = require_email(&payload.email)?;
    let session = state.identity.sign_in(&email, &payload.password).await?;
    let profile = state.engine.profile(&session.uid).await?;

    Ok(Json(SessionResponse {
        uid: session.uid,
        token: session.token,
        role: map_role(profile.role),
    }))
}

pub async fn sign_in_google(
    State(state): State<ServerState>,
    Json(payload): Json<GoogleSignInRequest>,
) -> Result<Json<SessionResponse>, ServerError> {
    let session = state.identity.sign_in_federated(&payload.id_token).await?;

    let email = session.email.clone().unwrap_or_default();
    let name = session
        .display_name
        .clone()
        .or_else(|| email.split('@').next().map(ToString::to_string))
        .unwrap_or_else(|| "Google user".to_string());
    let profile = state.engine.ensure_profile(&session.uid, &name, &email).await?;

    Ok(Json(SessionResponse {
        uid: session.uid,
        token: session.token,
        role: map_role(profile.role),
    }))
}

pub async fn reset_password(
    State(state): State<ServerState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ServerError> {
    let email = require_email(&payload.email)?;
    match state.identity.send_password_reset(&email).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        // Do not reveal whether the address is registered.
        Err(IdentityError::InvalidCredentials) => {
            tracing::info!(%email, "password reset requested for unknown email");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => Err(err.into()),
    }
}
