//! End-to-end tests: authenticate, fetch and sweep against a simulated
//! Taiga server behind the transport boundary.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use storysync::auth::{Credentials, StaticCredentials};
use storysync::client::ApiClient;
use storysync::http::{HttpError, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use storysync::sync::{
    CancellationFlag, LinkOptions, SweepOptions, link_issues, sweep_duplicates,
};
use storysync::taiga::TaigaClient;
use storysync::{ApiError, AuthenticationError, StoryTarget, SyncError};

const BASE: &str = "https://taiga.test/api/v1";
const PROJECT: i64 = 7;
const TOKEN: &str = "session-token";

/// A tiny in-memory Taiga: stories and issues live in vectors and every
/// request is recorded.
#[derive(Clone, Default)]
struct FakeTaiga {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    issues: Vec<serde_json::Value>,
    stories: Vec<serde_json::Value>,
    next_id: i64,
    requests: Vec<(HttpMethod, String)>,
    expire_after_auth: bool,
}

fn json(status: u16, body: serde_json::Value) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        body: body.to_string().into_bytes(),
    }
}

impl FakeTaiga {
    fn with_stories(generated_from: &[Option<i64>]) -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            state.next_id = 100;
            for (i, gfi) in generated_from.iter().enumerate() {
                let id = i as i64 + 1;
                state.stories.push(serde_json::json!({
                    "id": id,
                    "ref": id,
                    "subject": format!("story {id}"),
                    "generated_from_issue": gfi,
                    "external_reference": null,
                }));
            }
        }
        fake
    }

    fn with_issues(self, issues: Vec<serde_json::Value>) -> Self {
        self.state.lock().unwrap().issues = issues;
        self
    }

    fn story_ids(&self) -> Vec<i64> {
        self.state
            .lock()
            .unwrap()
            .stories
            .iter()
            .map(|s| s["id"].as_i64().unwrap())
            .collect()
    }

    fn count(&self, method: HttpMethod) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(m, _)| *m == method)
            .count()
    }
}

#[async_trait]
impl HttpTransport for FakeTaiga {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push((request.method, request.url.clone()));

        let path = request
            .url
            .strip_prefix(BASE)
            .ok_or_else(|| HttpError::Transport(format!("unknown host: {}", request.url)))?
            .to_string();

        if path == "/auth" {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            return Ok(if body["password"] == "correct" {
                json(200, serde_json::json!({"auth_token": TOKEN}))
            } else {
                json(400, serde_json::json!({"detail": "bad credentials"}))
            });
        }

        let expected = format!("Bearer {TOKEN}");
        let authorized = request
            .headers
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case("authorization") && *v == expected);
        if !authorized || state.expire_after_auth {
            return Ok(json(401, serde_json::json!({"detail": "Invalid token"})));
        }

        let listing = format!("?project={PROJECT}");
        match request.method {
            HttpMethod::Get if path == format!("/userstories{listing}") => {
                Ok(json(200, serde_json::Value::Array(state.stories.clone())))
            }
            HttpMethod::Get if path == format!("/issues{listing}") => {
                Ok(json(200, serde_json::Value::Array(state.issues.clone())))
            }
            HttpMethod::Post if path == "/userstories" => {
                let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
                let id = state.next_id;
                state.next_id += 1;
                let story = serde_json::json!({
                    "id": id,
                    "ref": id,
                    "subject": body["subject"],
                    "generated_from_issue": body["generated_from_issue"],
                    "external_reference": null,
                });
                state.stories.push(story.clone());
                Ok(json(201, story))
            }
            HttpMethod::Delete => {
                let id: i64 = path
                    .strip_prefix("/userstories/")
                    .and_then(|id| id.parse().ok())
                    .ok_or_else(|| HttpError::Transport(format!("bad path {path}")))?;
                state.stories.retain(|s| s["id"] != id);
                Ok(HttpResponse {
                    status: 204,
                    headers: Vec::new(),
                    body: Vec::new(),
                })
            }
            _ => Ok(json(404, serde_json::json!({"detail": "not found"}))),
        }
    }
}

async fn login(fake: &FakeTaiga, password: &str) -> Result<TaigaClient, AuthenticationError> {
    let api = ApiClient::new_with_transport(BASE, Arc::new(fake.clone()));
    let credentials = StaticCredentials(Credentials::new("bot", password));
    TaigaClient::login(api, PROJECT, &credentials).await
}

#[tokio::test]
async fn sweep_twice_deletes_once() {
    let fake = FakeTaiga::with_stories(&[Some(1), Some(1), Some(2), Some(1), None, None]);
    let taiga = login(&fake, "correct").await.expect("login");
    let cancel = CancellationFlag::new();

    let first = sweep_duplicates(&taiga, &SweepOptions::default(), &cancel, None)
        .await
        .expect("first sweep");
    assert_eq!(first.deleted, 2);
    assert_eq!(first.unlinked, 2);
    assert_eq!(fake.story_ids(), vec![1, 3, 5, 6]);

    let second = sweep_duplicates(&taiga, &SweepOptions::default(), &cancel, None)
        .await
        .expect("second sweep");
    assert_eq!(second.duplicates, 0);
    assert_eq!(fake.count(HttpMethod::Delete), 2);
}

#[tokio::test]
async fn dry_run_sweep_sends_no_deletes() {
    let fake = FakeTaiga::with_stories(&[Some(1), Some(1), Some(1)]);
    let taiga = login(&fake, "correct").await.expect("login").into_read_only();

    let result = sweep_duplicates(
        &taiga,
        &SweepOptions { dry_run: true },
        &CancellationFlag::new(),
        None,
    )
    .await
    .expect("dry run");

    assert_eq!(result.would_delete, 2);
    assert_eq!(fake.count(HttpMethod::Delete), 0);
    assert_eq!(fake.story_ids(), vec![1, 2, 3]);

    let refused = taiga.delete_user_story(2).await.expect_err("read-only session");
    assert!(matches!(refused, ApiError::ReadOnly { .. }));
    assert_eq!(fake.count(HttpMethod::Delete), 0);
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let fake = FakeTaiga::with_stories(&[]);
    let err = login(&fake, "wrong").await.expect_err("rejected");
    assert!(matches!(err, AuthenticationError::Rejected { status: 400, .. }));
}

#[tokio::test]
async fn expired_session_aborts_sweep() {
    let fake = FakeTaiga::with_stories(&[Some(1), Some(1)]);
    let taiga = login(&fake, "correct").await.expect("login");
    fake.state.lock().unwrap().expire_after_auth = true;

    let err = sweep_duplicates(
        &taiga,
        &SweepOptions::default(),
        &CancellationFlag::new(),
        None,
    )
    .await
    .expect_err("expired");

    assert!(matches!(
        err,
        SyncError::Auth(AuthenticationError::Expired { status: 401, .. })
    ));
    assert_eq!(fake.count(HttpMethod::Delete), 0);
}

#[tokio::test]
async fn link_then_sweep_leaves_one_story_per_issue() {
    let fake = FakeTaiga::with_stories(&[Some(11)]).with_issues(vec![
        serde_json::json!({"id": 11, "ref": 1, "subject": "known", "generated_user_stories": []}),
        serde_json::json!({"id": 12, "ref": 2, "subject": "new", "generated_user_stories": []}),
        serde_json::json!({"id": 13, "ref": 3, "subject": "linked", "generated_user_stories": [5]}),
    ]);
    let taiga = login(&fake, "correct").await.expect("login");
    let cancel = CancellationFlag::new();

    let linked = link_issues(&taiga, &taiga, &LinkOptions::default(), &cancel, None)
        .await
        .expect("link");
    assert_eq!(linked.created, 1);
    assert_eq!(linked.skipped, 2);
    assert_eq!(fake.count(HttpMethod::Post), 2); // auth + one create

    let swept = sweep_duplicates(&taiga, &SweepOptions::default(), &cancel, None)
        .await
        .expect("sweep");
    assert_eq!(swept.duplicates, 0);
}
