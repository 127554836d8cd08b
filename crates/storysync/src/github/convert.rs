//! Conversion from GitHub wire types to tracker-agnostic records.

use super::types::GitHubIssue;
use crate::platform::SourceIssue;

pub fn to_source_issue(issue: GitHubIssue) -> SourceIssue {
    let is_pull_request = issue.is_pull_request();
    SourceIssue {
        id: issue.id,
        number: issue.number,
        subject: issue.title,
        description: issue.body.filter(|b| !b.is_empty()),
        external_locator: Some(issue.html_url),
        generated_user_stories: 0,
        is_pull_request,
    }
}
