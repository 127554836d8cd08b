//! GitHub API client for the issue import.

use async_trait::async_trait;

use super::convert::to_source_issue;
use super::types::{GitHubIssue, IssueState};
use crate::client::{ApiClient, Authorization};
use crate::error::FetchError;
use crate::pagination::{CollectionRequest, PageStrategy, fetch_collection};
use crate::platform::{IssueSource, SourceIssue};
use crate::sync::ProgressCallback;

/// Public GitHub API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Media type GitHub recommends for REST v3.
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Read-only client for one repository's issues.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    api: ApiClient,
    owner: String,
    repo: String,
    state: IssueState,
}

impl GitHubClient {
    pub fn new(api: ApiClient, owner: &str, repo: &str) -> Self {
        Self {
            api: api.with_header("Accept", GITHUB_ACCEPT),
            owner: owner.to_string(),
            repo: repo.to_string(),
            state: IssueState::default(),
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.api = self
            .api
            .with_authorization(Authorization::Bearer(token.to_string()));
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: IssueState) -> Self {
        self.state = state;
        self
    }

    /// `owner/repo`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Every issue (and pull request) matching the state filter, following
    /// `Link` headers page by page.
    pub async fn list_raw_issues(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<GitHubIssue>, FetchError> {
        let request = CollectionRequest::new(
            "issues",
            &format!("/repos/{}/{}/issues", self.owner, self.repo),
            PageStrategy::link_header(),
        )
        .filter("state", self.state.as_str());

        fetch_collection(&self.api, &request, on_progress).await
    }
}

#[async_trait]
impl IssueSource for GitHubClient {
    fn provider(&self) -> &'static str {
        "github"
    }

    async fn list_issues(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<SourceIssue>, FetchError> {
        let issues = self.list_raw_issues(on_progress).await?;
        tracing::debug!(repo = %self.full_name(), count = issues.len(), "Listed GitHub issues");
        Ok(issues.into_iter().map(to_source_issue).collect())
    }
}
