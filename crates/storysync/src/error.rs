//! Error types for tracker API operations.
//!
//! [`ApiError`] is the uniform failure of a single HTTP call. The remaining
//! types attach that cause to the thing that was being done when it failed:
//! authenticating, fetching a page, creating a story for an issue, or deleting
//! a duplicate story.

use thiserror::Error;

use crate::http::HttpError;

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport could not complete the exchange.
    #[error("transport error: {0}")]
    Transport(String),

    /// No response arrived within the configured timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The server answered 401; the credential or session is not accepted.
    #[error("unauthorized ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    /// The server answered with any other non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A read-only client was asked to change remote state.
    #[error("refusing {method} {path} on a read-only client")]
    ReadOnly { method: String, path: String },

    /// The response body was not the expected JSON shape.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The pagination metadata would not terminate.
    #[error("pagination error: {0}")]
    Pagination(String),
}

impl ApiError {
    /// Whether re-running the same call later might succeed.
    ///
    /// Nothing retries automatically; this only informs the operator.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::Timeout { .. } => true,
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub(crate) fn from_http(err: HttpError, timeout_secs: u64) -> Self {
        match err {
            HttpError::Timeout => ApiError::Timeout { secs: timeout_secs },
            other => ApiError::Transport(other.to_string()),
        }
    }
}

/// Authentication failed or the session is no longer valid. Always fatal.
#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// The auth endpoint rejected the credentials.
    #[error("authentication rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// A call made with the bearer token was answered 401.
    #[error("session expired or invalid ({status}): {body}")]
    Expired { status: u16, body: String },

    /// The auth endpoint answered 2xx without a token.
    #[error("auth response did not contain a token")]
    MissingToken,

    /// Credentials could not be obtained from the provider.
    #[error("credentials unavailable: {0}")]
    Credentials(String),

    /// The auth request itself failed before a status was received.
    #[error("authentication request failed: {0}")]
    Request(#[source] ApiError),
}

impl AuthenticationError {
    /// Convert a call failure into an expiry error, if it is a 401.
    pub fn expired_from(cause: &ApiError) -> Option<Self> {
        match cause {
            ApiError::Unauthorized { status, body } => Some(AuthenticationError::Expired {
                status: *status,
                body: body.clone(),
            }),
            _ => None,
        }
    }
}

/// A page of a collection could not be fetched. No partial result is kept.
#[derive(Debug, Error)]
#[error("failed to fetch {collection} (page {page}): {cause}")]
pub struct FetchError {
    pub collection: String,
    pub page: u32,
    #[source]
    pub cause: ApiError,
}

/// Creating the linked story for one issue failed.
#[derive(Debug, Error)]
#[error("failed to create story for issue {issue_id}: {cause}")]
pub struct LinkCreationError {
    pub issue_id: i64,
    /// Human-facing issue number, for the summary.
    pub issue_ref: u64,
    pub subject: String,
    #[source]
    pub cause: ApiError,
}

/// Deleting one duplicate story failed.
#[derive(Debug, Error)]
#[error("failed to delete story {story_id}: {cause}")]
pub struct DeletionError {
    pub story_id: i64,
    pub story_ref: u64,
    pub generated_from_issue: Option<i64>,
    #[source]
    pub cause: ApiError,
}

/// Fatal errors that abort a batch job.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Auth(#[from] AuthenticationError),

    #[error(transparent)]
    Fetch(FetchError),
}

impl From<FetchError> for SyncError {
    /// A 401 while fetching means the session expired mid-run.
    fn from(err: FetchError) -> Self {
        match AuthenticationError::expired_from(&err.cause) {
            Some(auth) => SyncError::Auth(auth),
            None => SyncError::Fetch(err),
        }
    }
}

/// Result type for batch jobs.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Get a short error message suitable for display.
///
/// Takes the first line and truncates long server bodies.
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    let line = full.lines().next().unwrap_or(&full);
    if line.chars().count() > 120 {
        // Use chars() to avoid panicking on multi-byte UTF-8
        let truncated: String = line.chars().take(117).collect();
        format!("{}...", truncated)
    } else {
        line.to_string()
    }
}
