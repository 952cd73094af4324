use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, IdentityError};

use serde::Serialize;

pub use mailer::{LogMailer, Mailer, MailerError, SmtpMailer};
pub use otp::OtpService;
pub use server::{AuthUser, ServerState, router, run, run_with_listener, spawn_with_listener};

mod auth;
mod donations;
mod mailer;
mod otp;
mod programs;
mod reports;
mod server;
mod users;
mod volunteers;

pub enum ServerError {
    Engine(EngineError),
    Identity(IdentityError),
    Generic(String),
}

//TODO: Find a better solution
#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::AlreadyExists(_) => StatusCode::CONFLICT,
        EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_) | EngineError::InvalidField(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Store(store_err) => {
            tracing::error!("store error: {store_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

fn status_for_identity_error(err: &IdentityError) -> StatusCode {
    match err {
        IdentityError::InvalidCredentials | IdentityError::InvalidToken => StatusCode::UNAUTHORIZED,
        IdentityError::EmailInUse => StatusCode::CONFLICT,
        IdentityError::WeakPassword => StatusCode::UNPROCESSABLE_ENTITY,
        IdentityError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_identity_error(err: IdentityError) -> String {
    match err {
        IdentityError::Backend(detail) => {
            tracing::error!("identity backend error: {detail}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Identity(err) => (
                status_for_identity_error(&err),
                message_for_identity_error(err),
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<IdentityError> for ServerError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_forbidden_maps_to_403() {
        let res = ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::AlreadyExists("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn identity_wrong_password_maps_to_401() {
        let res = ServerError::from(IdentityError::InvalidCredentials).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn identity_email_in_use_maps_to_409() {
        let res = ServerError::from(IdentityError::EmailInUse).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
