//! Conversion from Taiga wire types to tracker-agnostic records.

use super::types::{TaigaIssue, TaigaUserStory};
use crate::platform::{ExternalReference, SourceIssue, TargetStory};

pub fn to_source_issue(issue: TaigaIssue) -> SourceIssue {
    SourceIssue {
        id: issue.id,
        number: issue.reference,
        subject: issue.subject,
        description: issue.description.filter(|d| !d.is_empty()),
        external_locator: None,
        generated_user_stories: issue.generated_user_stories.map_or(0, |v| v.len()),
        is_pull_request: false,
    }
}

pub fn to_target_story(story: TaigaUserStory) -> TargetStory {
    // A malformed reference (not a pair) is treated as absent
    let external_reference = match story.external_reference.as_deref() {
        Some([provider, url, ..]) => Some(ExternalReference::new(provider, url)),
        _ => None,
    };

    TargetStory {
        id: story.id,
        reference: story.reference,
        subject: story.subject,
        generated_from_issue: story.generated_from_issue,
        external_reference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_source_issue_counts_generated_stories() {
        let issue = TaigaIssue {
            id: 7,
            reference: 31,
            subject: "Crash on start".to_string(),
            description: Some(String::new()),
            generated_user_stories: Some(vec![serde_json::json!(1), serde_json::json!(2)]),
        };
        let converted = to_source_issue(issue);
        assert_eq!(converted.id, 7);
        assert_eq!(converted.number, 31);
        assert_eq!(converted.generated_user_stories, 2);
        assert_eq!(converted.description, None);
        assert!(!converted.is_pull_request);
    }

    #[test]
    fn test_to_target_story_reference_pair() {
        let story = TaigaUserStory {
            id: 1,
            reference: 2,
            subject: "s".to_string(),
            generated_from_issue: Some(7),
            external_reference: Some(vec!["github".to_string(), "https://x".to_string()]),
        };
        let converted = to_target_story(story);
        assert_eq!(converted.generated_from_issue, Some(7));
        assert_eq!(
            converted.external_reference,
            Some(ExternalReference::new("github", "https://x"))
        );
    }

    #[test]
    fn test_to_target_story_malformed_reference_is_none() {
        let story = TaigaUserStory {
            id: 1,
            reference: 2,
            subject: "s".to_string(),
            generated_from_issue: None,
            external_reference: Some(vec!["github".to_string()]),
        };
        assert_eq!(to_target_story(story).external_reference, None);
    }
}
