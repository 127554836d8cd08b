//! Taiga API client.

use async_trait::async_trait;

use super::convert::{to_source_issue, to_target_story};
use super::types::{TaigaIssue, TaigaUserStory};
use crate::auth::{CredentialProvider, authenticate};
use crate::client::{ApiClient, Authorization};
use crate::error::{ApiError, AuthenticationError, FetchError};
use crate::pagination::{CollectionRequest, PageStrategy, fetch_collection};
use crate::platform::{IssueSource, NewUserStory, SourceIssue, StoryTarget, TargetStory};
use crate::sync::ProgressCallback;

/// Hosted Taiga API base URL.
pub const DEFAULT_API_URL: &str = "https://api.taiga.io/api/v1";

/// Client for one Taiga project.
#[derive(Debug, Clone)]
pub struct TaigaClient {
    api: ApiClient,
    project_id: i64,
}

impl TaigaClient {
    /// Wrap an API client. Calls other than [`TaigaClient::login`] need an
    /// authorized client.
    pub fn new(api: ApiClient, project_id: i64) -> Self {
        Self { api, project_id }
    }

    /// Authenticate and return a client that sends the session token.
    pub async fn login(
        api: ApiClient,
        project_id: i64,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self, AuthenticationError> {
        let token = authenticate(&api, credentials).await?;
        Ok(Self::new(
            api.with_authorization(Authorization::Bearer(token)),
            project_id,
        ))
    }

    /// The same session, unable to create or delete anything.
    #[must_use]
    pub fn into_read_only(self) -> Self {
        Self {
            api: self.api.read_only(),
            ..self
        }
    }

    fn collection(&self, name: &str) -> CollectionRequest {
        CollectionRequest::new(name, &format!("/{name}"), PageStrategy::Unpaginated)
            .filter("project", self.project_id)
    }

    /// All issues of the project, in one round-trip.
    pub async fn list_raw_issues(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<TaigaIssue>, FetchError> {
        fetch_collection(&self.api, &self.collection("issues"), on_progress).await
    }

    /// All user stories of the project, in one round-trip.
    pub async fn list_raw_user_stories(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<TaigaUserStory>, FetchError> {
        fetch_collection(&self.api, &self.collection("userstories"), on_progress).await
    }
}

#[async_trait]
impl IssueSource for TaigaClient {
    fn provider(&self) -> &'static str {
        "taiga"
    }

    async fn list_issues(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<SourceIssue>, FetchError> {
        let issues = self.list_raw_issues(on_progress).await?;
        Ok(issues.into_iter().map(to_source_issue).collect())
    }
}

#[async_trait]
impl StoryTarget for TaigaClient {
    fn project_id(&self) -> i64 {
        self.project_id
    }

    async fn list_user_stories(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<TargetStory>, FetchError> {
        let stories = self.list_raw_user_stories(on_progress).await?;
        Ok(stories.into_iter().map(to_target_story).collect())
    }

    async fn create_user_story(&self, story: &NewUserStory) -> Result<TargetStory, ApiError> {
        let created: TaigaUserStory = self.api.post_json("/userstories", story).await?;
        Ok(to_target_story(created))
    }

    async fn delete_user_story(&self, story_id: i64) -> Result<(), ApiError> {
        self.api
            .delete(&format!("/userstories/{story_id}"))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credentials, StaticCredentials};
    use crate::http::{HttpMethod, HttpResponse, MockTransport};
    use std::sync::Arc;

    const BASE: &str = "https://api.taiga.test/api/v1";

    fn client(transport: &MockTransport) -> TaigaClient {
        let api = ApiClient::new_with_transport(BASE, Arc::new(transport.clone()))
            .with_authorization(Authorization::Bearer("tok".to_string()));
        TaigaClient::new(api, 114180)
    }

    #[tokio::test]
    async fn test_login_attaches_bearer_token() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            format!("{BASE}/auth"),
            200,
            vec![],
            serde_json::json!({"auth_token": "session"}),
        );
        transport.push_json(
            HttpMethod::Get,
            format!("{BASE}/issues?project=5"),
            200,
            vec![],
            serde_json::json!([]),
        );

        let api = ApiClient::new_with_transport(BASE, Arc::new(transport.clone()));
        let credentials = StaticCredentials(Credentials::new("u", "p"));
        let client = TaigaClient::login(api, 5, &credentials)
            .await
            .expect("login");

        let issues = client.list_issues(None).await.expect("list");
        assert!(issues.is_empty());
        let requests = transport.requests();
        assert_eq!(requests[0].header("authorization"), None);
        assert_eq!(requests[1].header("authorization"), Some("Bearer session"));
    }

    #[tokio::test]
    async fn test_list_issues_disables_pagination() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            format!("{BASE}/issues?project=114180"),
            200,
            vec![],
            serde_json::json!([
                {"id": 1, "ref": 10, "subject": "first", "generated_user_stories": []},
                {"id": 2, "ref": 11, "subject": "second", "generated_user_stories": [{"id": 9}]},
            ]),
        );

        let issues = client(&transport).list_issues(None).await.expect("list");
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].subject, "first");
        assert!(!issues[0].has_generated_stories());
        assert!(issues[1].has_generated_stories());

        let request = &transport.requests()[0];
        assert_eq!(request.header("x-disable-pagination"), Some("True"));
    }

    #[tokio::test]
    async fn test_create_user_story_posts_payload() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            format!("{BASE}/userstories"),
            201,
            vec![],
            serde_json::json!({"id": 500, "ref": 77, "subject": "first", "generated_from_issue": 1}),
        );
        let client = client(&transport);

        let issue = SourceIssue {
            id: 1,
            number: 10,
            subject: "first".to_string(),
            description: None,
            external_locator: None,
            generated_user_stories: 0,
            is_pull_request: false,
        };
        let created = client
            .create_user_story(&NewUserStory::generated_from(client.project_id(), &issue))
            .await
            .expect("create");
        assert_eq!(created.id, 500);
        assert_eq!(created.reference, 77);

        let sent: serde_json::Value =
            serde_json::from_slice(&transport.requests()[0].body).expect("json");
        assert_eq!(
            sent,
            serde_json::json!({"project": 114180, "subject": "first", "generated_from_issue": 1})
        );
    }

    #[tokio::test]
    async fn test_delete_user_story_accepts_no_content() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Delete,
            format!("{BASE}/userstories/42"),
            HttpResponse {
                status: 204,
                headers: Vec::new(),
                body: Vec::new(),
            },
        );

        client(&transport)
            .delete_user_story(42)
            .await
            .expect("delete");
        assert_eq!(transport.count(HttpMethod::Delete), 1);
    }

    #[tokio::test]
    async fn test_list_user_stories_failure_is_fetch_error() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            format!("{BASE}/userstories?project=114180"),
            401,
            vec![],
            serde_json::json!({"detail": "Invalid token"}),
        );

        let err = client(&transport)
            .list_user_stories(None)
            .await
            .expect_err("unauthorized");
        assert_eq!(err.collection, "userstories");
        assert!(err.cause.is_unauthorized());
    }
}
