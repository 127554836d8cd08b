//! GitHub issues client for the import job.
//!
//! Only the issue listing is used. Issues are read page by page following
//! the `Link` response header and converted to [`SourceIssue`] records for
//! the linker.
//!
//! ```ignore
//! use storysync::github::GitHubClient;
//! use storysync::sync::{ImportOptions, import_issues};
//!
//! let github = GitHubClient::new(api, "lago-project", "lago").with_token(&token);
//! let result = import_issues(&github, &taiga, &ImportOptions::new(159), &cancel, None).await?;
//! ```
//!
//! [`SourceIssue`]: crate::platform::SourceIssue

mod client;
mod convert;
mod types;

pub use client::{DEFAULT_API_URL, GitHubClient};
pub use convert::to_source_issue;
pub use types::{GitHubIssue, IssueState};
