//! GitHub REST v3 wire types.

use serde::Deserialize;

/// An item from `GET /repos/{owner}/{repo}/issues`.
///
/// GitHub lists pull requests in this endpoint too; they carry a
/// `pull_request` object.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubIssue {
    pub id: i64,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl GitHubIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Issue state filter for the listing endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IssueState {
    #[default]
    Open,
    Closed,
    All,
}

impl IssueState {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
            IssueState::All => "all",
        }
    }
}

impl std::str::FromStr for IssueState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(IssueState::Open),
            "closed" => Ok(IssueState::Closed),
            "all" => Ok(IssueState::All),
            other => Err(format!(
                "invalid issue state '{}', expected open, closed or all",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_pull_request_shapes() {
        let issue: GitHubIssue = serde_json::from_value(serde_json::json!({
            "id": 1001,
            "number": 12,
            "title": "Broken build",
            "body": null,
            "html_url": "https://github.com/lago-project/lago/issues/12",
            "state": "open",
            "created_at": "2016-03-01T10:00:00Z",
            "user": {"login": "someone"}
        }))
        .expect("issue");
        assert!(!issue.is_pull_request());
        assert_eq!(issue.body, None);
        assert_eq!(issue.number, 12);

        let pr: GitHubIssue = serde_json::from_value(serde_json::json!({
            "id": 1002,
            "number": 13,
            "title": "Fix build",
            "html_url": "https://github.com/lago-project/lago/pull/13",
            "pull_request": {"url": "https://api.github.com/repos/lago-project/lago/pulls/13"}
        }))
        .expect("pr");
        assert!(pr.is_pull_request());
    }

    #[test]
    fn test_issue_state_parse() {
        assert_eq!("open".parse::<IssueState>(), Ok(IssueState::Open));
        assert_eq!("ALL".parse::<IssueState>(), Ok(IssueState::All));
        assert!("merged".parse::<IssueState>().is_err());
        assert_eq!(IssueState::default().as_str(), "open");
    }
}
