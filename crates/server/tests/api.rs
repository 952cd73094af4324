use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{
    Engine, IdentityProvider, LocalStore, MemoryIdentity, RegisterProfileCmd, UserRole,
};
use server::{LogMailer, OtpService, ServerState, router};

fn setup() -> (ServerState, Arc<MemoryIdentity>) {
    let identity = Arc::new(MemoryIdentity::in_memory());
    let engine = Engine::builder()
        .store(Arc::new(LocalStore::in_memory()))
        .build()
        .unwrap();
    let state = ServerState {
        engine: Arc::new(engine),
        identity: identity.clone(),
        otp: Arc::new(OtpService::new()),
        mailer: Arc::new(LogMailer),
    };
    (state, identity)
}

async fn send(
    state: &ServerState,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    router(state.clone()).oneshot(request).await.unwrap()
}

async fn send_json(
    state: &ServerState,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = send(state, method, uri, token, body).await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn admin_token(state: &ServerState, identity: &MemoryIdentity) -> String {
    let session = identity.sign_up("admin@example.com", "secret1").await.unwrap();
    state
        .engine
        .register_profile(RegisterProfileCmd {
            uid: session.uid.clone(),
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            role: UserRole::Admin,
        })
        .await
        .unwrap();
    session.token
}

fn program_payload() -> Value {
    json!({
        "title": "Clean Water",
        "description": "Wells for rural communities",
        "category": "Water",
        "location": "Kisumu",
        "manager": "Ada",
        "start_date": "2025-01-01",
        "end_date": "2025-12-31",
        "target_minor": 1_000_000,
        "status": "active",
    })
}

#[tokio::test]
async fn registration_flow_end_to_end() {
    let (state, _identity) = setup();

    let (status, body) = send_json(
        &state,
        "POST",
        "/api/auth/check-email",
        None,
        Some(json!({"email": "dana@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], true);

    let response = send(
        &state,
        "POST",
        "/api/auth/send-otp",
        None,
        Some(json!({"email": "dana@example.com"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Registering before verification is rejected.
    let (status, _) = send_json(
        &state,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": "dana@example.com", "password": "secret1", "name": "Dana"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The test reads the code straight off the OTP service (the mailer only
    // logs); reissuing replaces the mailed code, which is fine here.
    let code = state.otp.issue("dana@example.com", Utc::now());
    let response = send(
        &state,
        "POST",
        "/api/auth/verify-otp",
        None,
        Some(json!({"email": "dana@example.com", "code": code})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, session) = send_json(
        &state,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": "dana@example.com", "password": "secret1", "name": "Dana"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["role"], "donor");
    let token = session["token"].as_str().unwrap().to_string();

    let (status, me) = send_json(&state, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["name"], "Dana");
    assert_eq!(me["user"]["onboarding_completed"], false);
    assert!(me["sections"].as_array().unwrap().contains(&json!("donations")));

    let (status, _) = send_json(
        &state,
        "POST",
        "/api/me/onboarding",
        Some(&token),
        Some(json!({
            "interests": ["water"],
            "preferred_contact": "email",
            "how_heard": "friend",
            "donation_frequency": "monthly",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, me) = send_json(&state, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(me["user"]["onboarding_completed"], true);
}

#[tokio::test]
async fn wrong_password_maps_to_401() {
    let (state, identity) = setup();
    admin_token(&state, &identity).await;

    let (status, body) = send_json(
        &state,
        "POST",
        "/api/auth/sign-in",
        None,
        Some(json!({"email": "admin@example.com", "password": "wrong1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "wrong password");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let (state, _identity) = setup();
    let response = send(&state, "GET", "/api/programs", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&state, "GET", "/api/programs", Some("bogus"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn donation_flow_updates_raised_and_stats() {
    let (state, identity) = setup();
    let token = admin_token(&state, &identity).await;

    let (status, created) = send_json(
        &state,
        "POST",
        "/api/programs",
        Some(&token),
        Some(program_payload()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let program_id = created["id"].as_str().unwrap().to_string();

    let (status, _) = send_json(
        &state,
        "POST",
        "/api/donations",
        Some(&token),
        Some(json!({
            "program_id": program_id,
            "amount_minor": 250_000,
            "date": "2025-06-01",
            "status": "completed",
            "payment_method": "card",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, program) = send_json(
        &state,
        "GET",
        &format!("/api/programs/{program_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(program["raised_minor"], 250_000);

    let (status, stats) = send_json(&state, "GET", "/api/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_raised_minor"], 250_000);
    assert_eq!(stats["donation_count"], 1);
    assert_eq!(stats["active_programs"], 1);
}

#[tokio::test]
async fn donors_cannot_reach_admin_sections() {
    let (state, identity) = setup();
    admin_token(&state, &identity).await;

    let session = identity.sign_up("dana@example.com", "secret1").await.unwrap();
    state
        .engine
        .register_profile(RegisterProfileCmd {
            uid: session.uid.clone(),
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            role: UserRole::Donor,
        })
        .await
        .unwrap();

    for uri in ["/api/stats", "/api/users", "/api/reports/donations"] {
        let response = send(&state, "GET", uri, Some(&session.token), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "uri: {uri}");
    }

    let (status, _) = send_json(
        &state,
        "POST",
        "/api/programs",
        Some(&session.token),
        Some(program_payload()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reports_download_as_spreadsheet_or_csv() {
    let (state, identity) = setup();
    let token = admin_token(&state, &identity).await;
    send_json(
        &state,
        "POST",
        "/api/programs",
        Some(&token),
        Some(program_payload()),
    )
    .await;

    let response = send(
        &state,
        "GET",
        "/api/reports/programs?format=csv",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "text/csv"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("Title,Category,Target,Raised,Progress %,Status,Volunteers"));
    assert!(text.contains("Clean Water"));

    let response = send(
        &state,
        "GET",
        "/api/reports/donations?range=last7days",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.contains("spreadsheetml"));
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap();
    assert!(disposition.contains("donations-report.xlsx"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    // xlsx files are zip archives.
    assert_eq!(&bytes[..2], b"PK");
}
