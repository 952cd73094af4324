//! Identity provider client surface.
//!
//! Credentials, federated sign-in and password resets belong to an external
//! auth service. [`HttpIdentity`] is the REST client for an Identity
//! Toolkit-shaped backend; [`MemoryIdentity`] is the in-process fake used by
//! tests, the admin CLI and local deployments (optionally file-backed so
//! accounts survive restarts).

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identity provider errors, kept close to the user-facing vocabulary.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("wrong password")]
    InvalidCredentials,
    #[error("email already registered")]
    EmailInUse,
    #[error("password must be at least 6 characters")]
    WeakPassword,
    #[error("invalid or expired session token")]
    InvalidToken,
    #[error("identity backend error: {0}")]
    Backend(String),
}

/// An authenticated session: the provider-issued uid plus an opaque token.
///
/// `email`/`display_name` are filled when the provider reports them
/// (always for password sign-in, usually for federated sign-in).
#[derive(Clone, Debug)]
pub struct Session {
    pub uid: String,
    pub token: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn email_exists(&self, email: &str) -> Result<bool, IdentityError>;

    /// Create an account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// Federated (Google) sign-in by provider-issued ID token.
    async fn sign_in_federated(&self, id_token: &str) -> Result<Session, IdentityError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;

    /// Resolve an opaque session token to the account uid.
    async fn verify_token(&self, token: &str) -> Result<String, IdentityError>;
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Account {
    uid: String,
    /// `None` for federated-only accounts.
    password: Option<String>,
}

#[derive(Default, Serialize, Deserialize)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    /// Session tokens are ephemeral and never persisted.
    #[serde(skip)]
    tokens: HashMap<String, String>,
}

/// In-process identity fake.
pub struct MemoryIdentity {
    state: std::sync::Mutex<MemoryState>,
    path: Option<PathBuf>,
}

impl MemoryIdentity {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: std::sync::Mutex::new(MemoryState::default()),
            path: None,
        }
    }

    /// Open (or create) a file-backed account list.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, IdentityError> {
        let path = path.into();
        let state = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| IdentityError::Backend(err.to_string()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => MemoryState::default(),
            Err(err) => return Err(IdentityError::Backend(err.to_string())),
        };
        Ok(Self {
            state: std::sync::Mutex::new(state),
            path: Some(path),
        })
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        f(&mut state)
    }

    fn persist(&self, state: &MemoryState) -> Result<(), IdentityError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|err| IdentityError::Backend(err.to_string()))?;
        std::fs::write(path, bytes).map_err(|err| IdentityError::Backend(err.to_string()))
    }

    fn issue_token(state: &mut MemoryState, uid: &str, email: &str) -> Session {
        let token = Uuid::new_v4().simple().to_string();
        state.tokens.insert(token.clone(), uid.to_string());
        Session {
            uid: uid.to_string(),
            token,
            email: Some(email.to_string()),
            display_name: None,
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn email_exists(&self, email: &str) -> Result<bool, IdentityError> {
        Ok(self.with_state(|state| state.accounts.contains_key(email)))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        if password.len() < 6 {
            return Err(IdentityError::WeakPassword);
        }
        let session = self.with_state(|state| {
            if state.accounts.contains_key(email) {
                return Err(IdentityError::EmailInUse);
            }
            let uid = Uuid::new_v4().simple().to_string();
            state.accounts.insert(
                email.to_string(),
                Account {
                    uid: uid.clone(),
                    password: Some(password.to_string()),
                },
            );
            Ok(Self::issue_token(state, &uid, email))
        })?;
        self.with_state(|state| self.persist(state))?;
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        self.with_state(|state| {
            let Some(account) = state.accounts.get(email).cloned() else {
                return Err(IdentityError::InvalidCredentials);
            };
            if account.password.as_deref() != Some(password) {
                return Err(IdentityError::InvalidCredentials);
            }
            Ok(Self::issue_token(state, &account.uid, email))
        })
    }

    async fn sign_in_federated(&self, id_token: &str) -> Result<Session, IdentityError> {
        // The fake accepts tokens of the form `google:<email>`.
        let Some(email) = id_token.strip_prefix("google:") else {
            return Err(IdentityError::InvalidToken);
        };
        let email = email.to_string();
        let session = self.with_state(|state| {
            let uid = match state.accounts.get(&email) {
                Some(account) => account.uid.clone(),
                None => {
                    let uid = Uuid::new_v4().simple().to_string();
                    state.accounts.insert(
                        email.clone(),
                        Account {
                            uid: uid.clone(),
                            password: None,
                        },
                    );
                    uid
                }
            };
            Self::issue_token(state, &uid, &email)
        });
        self.with_state(|state| self.persist(state))?;
        Ok(session)
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let exists = self.email_exists(email).await?;
        if !exists {
            return Err(IdentityError::InvalidCredentials);
        }
        tracing::info!(email, "password reset requested (memory identity, no-op)");
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> Result<String, IdentityError> {
        self.with_state(|state| {
            state
                .tokens
                .get(token)
                .cloned()
                .ok_or(IdentityError::InvalidToken)
        })
    }
}

/// REST client for an Identity Toolkit-shaped auth backend.
pub struct HttpIdentity {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthUriResponse {
    #[serde(default)]
    registered: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
struct EmptyResponse {}

impl HttpIdentity {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn call<B: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<R, IdentityError> {
        let url = format!(
            "{}/v1/accounts:{endpoint}?key={}",
            self.base_url.trim_end_matches('/'),
            self.api_key
        );
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| IdentityError::Backend(err.to_string()))?;

        if response.status().is_success() {
            response
                .json::<R>()
                .await
                .map_err(|err| IdentityError::Backend(err.to_string()))
        } else {
            let api_error: ApiError = response.json().await.unwrap_or_default();
            Err(map_api_error(&api_error.error.message))
        }
    }
}

fn map_api_error(message: &str) -> IdentityError {
    match message {
        "EMAIL_EXISTS" => IdentityError::EmailInUse,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            IdentityError::InvalidCredentials
        }
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" => IdentityError::InvalidToken,
        other if other.starts_with("WEAK_PASSWORD") => IdentityError::WeakPassword,
        other => IdentityError::Backend(other.to_string()),
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentity {
    async fn email_exists(&self, email: &str) -> Result<bool, IdentityError> {
        let response: AuthUriResponse = self
            .call(
                "createAuthUri",
                &serde_json::json!({
                    "identifier": email,
                    "continueUri": "http://localhost",
                }),
            )
            .await?;
        Ok(response.registered)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let response: TokenResponse = self
            .call(
                "signUp",
                &serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        Ok(Session {
            uid: response.local_id,
            token: response.id_token,
            email: response.email.or_else(|| Some(email.to_string())),
            display_name: response.display_name,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let response: TokenResponse = self
            .call(
                "signInWithPassword",
                &serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        Ok(Session {
            uid: response.local_id,
            token: response.id_token,
            email: response.email.or_else(|| Some(email.to_string())),
            display_name: response.display_name,
        })
    }

    async fn sign_in_federated(&self, id_token: &str) -> Result<Session, IdentityError> {
        let response: TokenResponse = self
            .call(
                "signInWithIdp",
                &serde_json::json!({
                    "postBody": format!("id_token={id_token}&providerId=google.com"),
                    "requestUri": "http://localhost",
                    "returnSecureToken": true,
                }),
            )
            .await?;
        Ok(Session {
            uid: response.local_id,
            token: response.id_token,
            email: response.email,
            display_name: response.display_name,
        })
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let _: EmptyResponse = self
            .call(
                "sendOobCode",
                &serde_json::json!({
                    "requestType": "PASSWORD_RESET",
                    "email": email,
                }),
            )
            .await?;
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> Result<String, IdentityError> {
        let response: LookupResponse = self
            .call("lookup", &serde_json::json!({ "idToken": token }))
            .await?;
        response
            .users
            .into_iter()
            .next()
            .map(|user| user.local_id)
            .ok_or(IdentityError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let identity = MemoryIdentity::in_memory();
        identity.sign_up("a@example.com", "secret1").await.unwrap();
        let session = identity.sign_in("a@example.com", "secret1").await.unwrap();
        let uid = identity.verify_token(&session.token).await.unwrap();
        assert_eq!(uid, session.uid);
    }

    #[tokio::test]
    async fn sign_up_rejects_duplicates_and_weak_passwords() {
        let identity = MemoryIdentity::in_memory();
        assert!(matches!(
            identity.sign_up("a@example.com", "short").await,
            Err(IdentityError::WeakPassword)
        ));
        identity.sign_up("a@example.com", "secret1").await.unwrap();
        assert!(matches!(
            identity.sign_up("a@example.com", "secret2").await,
            Err(IdentityError::EmailInUse)
        ));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let identity = MemoryIdentity::in_memory();
        identity.sign_up("a@example.com", "secret1").await.unwrap();
        assert!(matches!(
            identity.sign_in("a@example.com", "nope99").await,
            Err(IdentityError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn federated_sign_in_creates_account_once() {
        let identity = MemoryIdentity::in_memory();
        let first = identity
            .sign_in_federated("google:b@example.com")
            .await
            .unwrap();
        let second = identity
            .sign_in_federated("google:b@example.com")
            .await
            .unwrap();
        assert_eq!(first.uid, second.uid);
        assert!(identity.email_exists("b@example.com").await.unwrap());
    }
}
