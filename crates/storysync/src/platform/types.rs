//! Tracker-agnostic records and the traits tracker clients implement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, FetchError};
use crate::sync::ProgressCallback;

/// An issue read from the source tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIssue {
    /// Source tracker primary key.
    pub id: i64,
    /// Human-facing sequence number (`ref` on Taiga, `number` on GitHub).
    pub number: u64,
    pub subject: String,
    pub description: Option<String>,
    /// Canonical URL of the issue, used as the cross-reference payload.
    pub external_locator: Option<String>,
    /// How many target stories the server says were generated from this issue.
    pub generated_user_stories: usize,
    /// GitHub lists pull requests in the issues endpoint.
    pub is_pull_request: bool,
}

impl SourceIssue {
    /// Whether the server already reports a story generated from this issue.
    pub fn has_generated_stories(&self) -> bool {
        self.generated_user_stories > 0
    }
}

/// Provider tag and canonical URL of the record a story was imported from.
///
/// Serialized the way Taiga stores it: a two-element array `["github", url]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ExternalReference {
    pub provider: String,
    pub url: String,
}

impl ExternalReference {
    pub fn new(provider: &str, url: &str) -> Self {
        Self {
            provider: provider.to_string(),
            url: url.to_string(),
        }
    }
}

impl From<(String, String)> for ExternalReference {
    fn from((provider, url): (String, String)) -> Self {
        Self { provider, url }
    }
}

impl From<ExternalReference> for (String, String) {
    fn from(r: ExternalReference) -> Self {
        (r.provider, r.url)
    }
}

/// A user story on the target tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetStory {
    /// Target tracker primary key.
    pub id: i64,
    /// Human-facing sequence number assigned on creation.
    pub reference: u64,
    pub subject: String,
    /// Back-reference to the source issue id. The duplicate key.
    pub generated_from_issue: Option<i64>,
    pub external_reference: Option<ExternalReference>,
}

/// Create payload for a user story.
///
/// Absent optional fields are left out of the JSON body rather than sent as
/// `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUserStory {
    pub project: i64,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_from_issue: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<ExternalReference>,
}

impl NewUserStory {
    /// Story linked back to a source issue by id.
    pub fn generated_from(project: i64, issue: &SourceIssue) -> Self {
        Self {
            project,
            subject: issue.subject.clone(),
            description: None,
            generated_from_issue: Some(issue.id),
            external_reference: None,
        }
    }

    /// Story imported from another tracker, referenced by URL.
    pub fn imported_from(project: i64, provider: &str, issue: &SourceIssue) -> Self {
        Self {
            project,
            subject: issue.subject.clone(),
            description: issue.description.clone(),
            generated_from_issue: None,
            external_reference: issue
                .external_locator
                .as_deref()
                .map(|url| ExternalReference::new(provider, url)),
        }
    }
}

/// A tracker that provides issues.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Provider tag used in external references (e.g. "github").
    fn provider(&self) -> &'static str;

    /// Fetch every issue, in the tracker's native order.
    async fn list_issues(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<SourceIssue>, FetchError>;
}

/// A tracker that holds user stories for one project.
#[async_trait]
pub trait StoryTarget: Send + Sync {
    /// Project the stories belong to.
    fn project_id(&self) -> i64;

    /// Fetch every user story of the project, in server order.
    async fn list_user_stories(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<TargetStory>, FetchError>;

    /// Create a story. Returns it with its assigned id and ref.
    async fn create_user_story(&self, story: &NewUserStory) -> Result<TargetStory, ApiError>;

    async fn delete_user_story(&self, story_id: i64) -> Result<(), ApiError>;
}
