//! storysync - reconcile issues and user stories between two trackers.
//!
//! The library links source issues to target user stories idempotently,
//! imports issues from GitHub below a numeric cutoff, and sweeps duplicate
//! stories that share a back-reference.
//!
//! # Features
//!
//! - `github` - Enables the GitHub issue client used by the import job.
//!
//! # Example
//!
//! ```ignore
//! use storysync::auth::StaticCredentials;
//! use storysync::client::ApiClient;
//! use storysync::sync::{CancellationFlag, LinkOptions, link_issues};
//! use storysync::taiga::{DEFAULT_API_URL, TaigaClient};
//!
//! let api = ApiClient::new(DEFAULT_API_URL, std::time::Duration::from_secs(10))?;
//! let taiga = TaigaClient::login(api, 114180, &credentials).await?;
//! let result = link_issues(&taiga, &taiga, &LinkOptions::default(), &CancellationFlag::new(), None).await?;
//! println!("created {} stories", result.created);
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod pagination;
pub mod platform;
pub mod rate_limit;
pub mod sync;
pub mod taiga;

#[cfg(feature = "github")]
pub mod github;

pub use client::{ApiClient, Authorization};
pub use error::{
    ApiError, AuthenticationError, DeletionError, FetchError, LinkCreationError, SyncError,
    short_error_message,
};
pub use platform::{IssueSource, SourceIssue, StoryTarget, TargetStory};
pub use rate_limit::{ApiRateLimiter, rate_limits};
