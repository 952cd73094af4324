use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::sync::Arc;

use crate::{ServerError, auth, donations, mailer::Mailer, otp::OtpService, programs, reports, users, volunteers};
use engine::{Engine, EngineError, IdentityProvider, UserRole};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub identity: Arc<dyn IdentityProvider>,
    pub otp: Arc<OtpService>,
    pub mailer: Arc<dyn Mailer>,
}

/// The authenticated session, injected as a request extension.
///
/// Role-based visibility is a pure function of this object and the route
/// section; nothing else carries ambient auth state.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub uid: String,
    pub role: UserRole,
}

/// Sections of the API a role may use. `me` is implicit for every role.
pub fn section_allows(role: UserRole, section: &str) -> bool {
    match role {
        UserRole::Admin => true,
        UserRole::Donor | UserRole::Volunteer => matches!(section, "programs" | "donations" | "me"),
    }
}

pub fn sections_for_role(role: UserRole) -> Vec<String> {
    ["programs", "donations", "volunteers", "users", "reports", "me"]
        .into_iter()
        .filter(|section| section_allows(role, section))
        .map(ToString::to_string)
        .collect()
}

pub(crate) fn require_admin(user: &AuthUser) -> Result<(), ServerError> {
    if user.role == UserRole::Admin {
        Ok(())
    } else {
        Err(ServerError::Engine(EngineError::Forbidden(
            "admin role required".to_string(),
        )))
    }
}

async fn auth_middleware(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = auth_header.ok_or(StatusCode::UNAUTHORIZED)?;
    let uid = state
        .identity
        .verify_token(auth_header.token())
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let profile = state
        .engine
        .profile(&uid)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser {
        uid,
        role: profile.role,
    });
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/programs", get(programs::list).post(programs::create))
        .route(
            "/programs/{id}",
            get(programs::get)
                .patch(programs::update)
                .delete(programs::remove),
        )
        .route("/programs/{id}/recompute", post(programs::recompute))
        .route("/donations", get(donations::list).post(donations::create))
        .route("/donations/recent", get(donations::recent))
        .route(
            "/donations/{id}",
            axum::routing::patch(donations::update).delete(donations::remove),
        )
        .route(
            "/volunteers",
            get(volunteers::list).post(volunteers::create),
        )
        .route(
            "/volunteers/{id}",
            axum::routing::patch(volunteers::update).delete(volunteers::remove),
        )
        .route("/me", get(users::me).patch(users::update_me))
        .route("/me/onboarding", post(users::onboarding))
        .route("/users", get(users::list))
        .route("/stats", get(reports::stats))
        .route("/reports/donations", get(reports::donations_report))
        .route("/reports/programs", get(reports::programs_report))
        .route("/reports/volunteers", get(reports::volunteers_report))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let public = Router::new()
        .route("/auth/check-email", post(auth::check_email))
        .route("/auth/send-otp", post(auth::send_otp))
        .route("/auth/verify-otp", post(auth::verify_otp))
        .route("/auth/register", post(auth::register))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-in-google", post(auth::sign_in_google))
        .route("/auth/reset-password", post(auth::reset_password));

    Router::new()
        .nest("/api", public.merge(protected))
        .with_state(state)
}

pub async fn run(state: ServerState) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(state, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_sees_every_section() {
        for section in ["programs", "donations", "volunteers", "users", "reports"] {
            assert!(section_allows(UserRole::Admin, section));
        }
    }

    #[test]
    fn donor_is_limited_to_public_sections() {
        assert!(section_allows(UserRole::Donor, "programs"));
        assert!(section_allows(UserRole::Donor, "donations"));
        assert!(!section_allows(UserRole::Donor, "volunteers"));
        assert!(!section_allows(UserRole::Donor, "users"));
        assert!(!section_allows(UserRole::Donor, "reports"));
    }

    #[test]
    fn sections_for_role_matches_the_gate() {
        let sections = sections_for_role(UserRole::Volunteer);
        assert_eq!(sections, vec!["programs", "donations", "me"]);
    }
}
