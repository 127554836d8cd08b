//! In-memory tracker for exercising the batch jobs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::ProgressCallback;
use crate::error::{ApiError, FetchError};
use crate::platform::{IssueSource, NewUserStory, SourceIssue, StoryTarget, TargetStory};

pub(crate) const PROJECT_ID: i64 = 114180;

#[derive(Default)]
struct FakeState {
    issues: Vec<SourceIssue>,
    stories: Vec<TargetStory>,
    next_id: i64,
    next_ref: u64,
    /// Create fails with this status when the subject matches.
    fail_create: HashMap<String, u16>,
    /// Delete fails with this status for the story id.
    fail_delete: HashMap<i64, u16>,
    /// Listing stories fails with this status.
    fail_list_stories: Option<u16>,
    create_calls: Vec<NewUserStory>,
    delete_calls: Vec<i64>,
    list_story_calls: usize,
}

/// Both an issue source and a story target, backed by vectors.
#[derive(Clone, Default)]
pub(crate) struct FakeTracker {
    inner: Arc<Mutex<FakeState>>,
}

pub(crate) fn api_error(status: u16) -> ApiError {
    if status == 401 {
        ApiError::Unauthorized {
            status,
            body: "token expired".to_string(),
        }
    } else {
        ApiError::Status {
            status,
            body: format!("status {status}"),
        }
    }
}

pub(crate) fn issue(id: i64, number: u64, subject: &str) -> SourceIssue {
    SourceIssue {
        id,
        number,
        subject: subject.to_string(),
        description: None,
        external_locator: None,
        generated_user_stories: 0,
        is_pull_request: false,
    }
}

pub(crate) fn github_issue(number: u64) -> SourceIssue {
    SourceIssue {
        id: 10_000 + number as i64,
        number,
        subject: format!("GitHub issue {number}"),
        description: Some(format!("body {number}")),
        external_locator: Some(format!("https://github.com/o/r/issues/{number}")),
        generated_user_stories: 0,
        is_pull_request: false,
    }
}

pub(crate) fn story(id: i64, generated_from_issue: Option<i64>) -> TargetStory {
    TargetStory {
        id,
        reference: id as u64,
        subject: format!("story {id}"),
        generated_from_issue,
        external_reference: None,
    }
}

impl FakeTracker {
    pub(crate) fn new() -> Self {
        let tracker = Self::default();
        {
            let mut state = tracker.state();
            state.next_id = 1000;
            state.next_ref = 1;
        }
        tracker
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn with_issues(self, issues: Vec<SourceIssue>) -> Self {
        self.state().issues = issues;
        self
    }

    pub(crate) fn with_stories(self, stories: Vec<TargetStory>) -> Self {
        self.state().stories = stories;
        self
    }

    pub(crate) fn fail_create_for(&self, subject: &str, status: u16) {
        self.state().fail_create.insert(subject.to_string(), status);
    }

    pub(crate) fn fail_delete_for(&self, story_id: i64, status: u16) {
        self.state().fail_delete.insert(story_id, status);
    }

    pub(crate) fn fail_list_stories(&self, status: u16) {
        self.state().fail_list_stories = Some(status);
    }

    pub(crate) fn stories(&self) -> Vec<TargetStory> {
        self.state().stories.clone()
    }

    pub(crate) fn create_calls(&self) -> Vec<NewUserStory> {
        self.state().create_calls.clone()
    }

    pub(crate) fn delete_calls(&self) -> Vec<i64> {
        self.state().delete_calls.clone()
    }

    pub(crate) fn list_story_calls(&self) -> usize {
        self.state().list_story_calls
    }
}

#[async_trait]
impl IssueSource for FakeTracker {
    fn provider(&self) -> &'static str {
        "github"
    }

    async fn list_issues(
        &self,
        _on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<SourceIssue>, FetchError> {
        Ok(self.state().issues.clone())
    }
}

#[async_trait]
impl StoryTarget for FakeTracker {
    fn project_id(&self) -> i64 {
        PROJECT_ID
    }

    async fn list_user_stories(
        &self,
        _on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<TargetStory>, FetchError> {
        let mut state = self.state();
        state.list_story_calls += 1;
        if let Some(status) = state.fail_list_stories {
            return Err(FetchError {
                collection: "userstories".to_string(),
                page: 1,
                cause: api_error(status),
            });
        }
        Ok(state.stories.clone())
    }

    async fn create_user_story(&self, story: &NewUserStory) -> Result<TargetStory, ApiError> {
        let mut state = self.state();
        state.create_calls.push(story.clone());
        if let Some(status) = state.fail_create.get(&story.subject).copied() {
            return Err(api_error(status));
        }

        let created = TargetStory {
            id: state.next_id,
            reference: state.next_ref,
            subject: story.subject.clone(),
            generated_from_issue: story.generated_from_issue,
            external_reference: story.external_reference.clone(),
        };
        state.next_id += 1;
        state.next_ref += 1;
        state.stories.push(created.clone());
        Ok(created)
    }

    async fn delete_user_story(&self, story_id: i64) -> Result<(), ApiError> {
        let mut state = self.state();
        state.delete_calls.push(story_id);
        if let Some(status) = state.fail_delete.get(&story_id).copied() {
            return Err(api_error(status));
        }
        state.stories.retain(|s| s.id != story_id);
        Ok(())
    }
}

/// Collects emitted events for assertions.
#[derive(Clone, Default)]
pub(crate) struct EventLog(Arc<Mutex<Vec<super::SyncProgress>>>);

impl EventLog {
    pub(crate) fn callback(&self) -> ProgressCallback {
        let events = Arc::clone(&self.0);
        Box::new(move |event| {
            events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
        })
    }

    pub(crate) fn events(&self) -> Vec<super::SyncProgress> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
