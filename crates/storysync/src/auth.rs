//! Session authentication against the target tracker.
//!
//! Credentials are exchanged once per run for an opaque bearer token. The
//! token's lifetime is not tracked; a later 401 surfaces as
//! [`AuthenticationError::Expired`].

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::{ApiError, AuthenticationError};

/// Username and password for the target tracker.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of credentials, e.g. an interactive prompt.
pub trait CredentialProvider: Send + Sync {
    fn obtain(&self) -> Result<Credentials, AuthenticationError>;
}

/// Fixed credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credentials);

impl CredentialProvider for StaticCredentials {
    fn obtain(&self) -> Result<Credentials, AuthenticationError> {
        Ok(self.0.clone())
    }
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    auth_token: Option<String>,
}

/// Exchange credentials for a bearer token with one `POST /auth`.
///
/// No retry: a rejected credential is not transient.
pub async fn authenticate(
    api: &ApiClient,
    provider: &dyn CredentialProvider,
) -> Result<String, AuthenticationError> {
    let credentials = provider.obtain()?;

    tracing::debug!(username = %credentials.username, "Authenticating");

    let body = AuthRequest {
        kind: "normal",
        username: &credentials.username,
        password: &credentials.password,
    };

    let response: AuthResponse = api.post_json("/auth", &body).await.map_err(|e| match e {
        ApiError::Unauthorized { status, body } | ApiError::Status { status, body } => {
            AuthenticationError::Rejected { status, body }
        }
        other => AuthenticationError::Request(other),
    })?;

    match response.auth_token {
        Some(token) if !token.is_empty() => {
            tracing::info!(username = %credentials.username, "Authenticated");
            Ok(token)
        }
        _ => Err(AuthenticationError::MissingToken),
    }
}
