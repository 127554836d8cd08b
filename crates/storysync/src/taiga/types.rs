//! Taiga REST API v1 wire types.

use serde::Deserialize;

/// An issue as returned by `GET /issues`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaigaIssue {
    pub id: i64,
    #[serde(rename = "ref")]
    pub reference: u64,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Stories Taiga has recorded as generated from this issue. May be
    /// `null`, a list of ids or a list of objects; only emptiness matters.
    #[serde(default)]
    pub generated_user_stories: Option<Vec<serde_json::Value>>,
}

/// A user story as returned by `GET /userstories` and `POST /userstories`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaigaUserStory {
    pub id: i64,
    #[serde(rename = "ref")]
    pub reference: u64,
    pub subject: String,
    #[serde(default)]
    pub generated_from_issue: Option<i64>,
    /// `["github", "<url>"]` or `null`.
    #[serde(default)]
    pub external_reference: Option<Vec<String>>,
}
