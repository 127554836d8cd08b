//! Idempotent story linker.
//!
//! For each source issue, in fetch order, the linker decides whether a story
//! already exists for it and creates one if not. The same loop drives both
//! the Taiga issue linker and the GitHub import; [`LinkMode`] captures what
//! differs between them (filters, join key and payload).

use std::collections::HashSet;

use super::progress::{ProgressCallback, SkipReason, SyncProgress, emit};
use super::types::{CancellationFlag, LinkOptions, LinkResult};
use crate::error::{AuthenticationError, LinkCreationError, Result, short_error_message};
use crate::platform::{IssueSource, NewUserStory, SourceIssue, StoryTarget, TargetStory};

/// Join key between an issue and the stories that reference it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LinkKey {
    /// `generated_from_issue` back-reference.
    Issue(i64),
    /// External reference URL.
    Locator(String),
}

/// What differs between linking and importing.
#[derive(Debug, Clone, Copy)]
pub(super) enum LinkMode {
    /// Stories generated from issues of the same tracker.
    Generated,
    /// Stories imported from another tracker, filtered by number.
    Import {
        cutoff: u64,
        include_pull_requests: bool,
        provider: &'static str,
    },
}

impl LinkMode {
    fn issue_key(self, issue: &SourceIssue) -> Option<LinkKey> {
        match self {
            LinkMode::Generated => Some(LinkKey::Issue(issue.id)),
            LinkMode::Import { .. } => issue.external_locator.clone().map(LinkKey::Locator),
        }
    }

    fn story_key(self, story: &TargetStory) -> Option<LinkKey> {
        match self {
            LinkMode::Generated => story.generated_from_issue.map(LinkKey::Issue),
            LinkMode::Import { .. } => story
                .external_reference
                .as_ref()
                .map(|r| LinkKey::Locator(r.url.clone())),
        }
    }

    /// Filters applied before any lookup.
    fn exclude(self, issue: &SourceIssue) -> Option<SkipReason> {
        match self {
            LinkMode::Generated => None,
            LinkMode::Import {
                cutoff,
                include_pull_requests,
                ..
            } => {
                if issue.number >= cutoff {
                    Some(SkipReason::AboveCutoff { cutoff })
                } else if issue.is_pull_request && !include_pull_requests {
                    Some(SkipReason::PullRequest)
                } else {
                    None
                }
            }
        }
    }

    fn payload(self, project: i64, issue: &SourceIssue) -> NewUserStory {
        match self {
            LinkMode::Generated => NewUserStory::generated_from(project, issue),
            LinkMode::Import { provider, .. } => {
                NewUserStory::imported_from(project, provider, issue)
            }
        }
    }
}

/// Create a story for every issue of `source` that has none yet.
///
/// An issue is skipped when the source reports a generated story, or, with
/// `verify`, when a fetched story already references it. Per-issue create
/// failures are collected and the loop continues. A 401 aborts the run.
pub async fn link_issues<S, T>(
    source: &S,
    target: &T,
    options: &LinkOptions,
    cancel: &CancellationFlag,
    on_progress: Option<&ProgressCallback>,
) -> Result<LinkResult>
where
    S: IssueSource + ?Sized,
    T: StoryTarget + ?Sized,
{
    let issues = source.list_issues(on_progress).await?;
    run_linker(
        target,
        issues,
        LinkMode::Generated,
        options.dry_run,
        options.verify,
        cancel,
        on_progress,
    )
    .await
}

pub(super) async fn run_linker<T: StoryTarget + ?Sized>(
    target: &T,
    issues: Vec<SourceIssue>,
    mode: LinkMode,
    dry_run: bool,
    verify: bool,
    cancel: &CancellationFlag,
    on_progress: Option<&ProgressCallback>,
) -> Result<LinkResult> {
    let mut result = LinkResult {
        total: issues.len(),
        ..Default::default()
    };

    let (mut index, indexed_stories) = if verify {
        let stories = target.list_user_stories(on_progress).await?;
        let keys: HashSet<LinkKey> = stories.iter().filter_map(|s| mode.story_key(s)).collect();
        (Some(keys), Some(stories.len()))
    } else {
        (None, None)
    };

    emit(
        on_progress,
        SyncProgress::LinkingIssues {
            count: issues.len(),
            indexed_stories,
            dry_run,
        },
    );

    let project = target.project_id();

    for (position, issue) in issues.iter().enumerate() {
        if cancel.is_cancelled() {
            let remaining = issues.len() - position;
            tracing::warn!(remaining, "Linking cancelled");
            result.cancelled = true;
            emit(on_progress, SyncProgress::Cancelled { remaining });
            break;
        }

        result.processed += 1;
        let key = mode.issue_key(issue);

        let skip = mode
            .exclude(issue)
            .or_else(|| {
                issue
                    .has_generated_stories()
                    .then_some(SkipReason::AlreadyLinked)
            })
            .or_else(|| match (&index, &key) {
                (Some(index), Some(key)) if index.contains(key) => Some(SkipReason::ExistingStory),
                _ => None,
            });

        if let Some(reason) = skip {
            tracing::debug!(issue_id = issue.id, issue_ref = issue.number, %reason, "Skipping issue");
            result.skipped += 1;
            emit(
                on_progress,
                SyncProgress::IssueSkipped {
                    issue_id: issue.id,
                    issue_ref: issue.number,
                    subject: issue.subject.clone(),
                    reason,
                },
            );
            continue;
        }

        let payload = mode.payload(project, issue);

        if dry_run {
            tracing::debug!(issue_id = issue.id, issue_ref = issue.number, "Would create story");
            result.would_create += 1;
            if let (Some(index), Some(key)) = (index.as_mut(), key) {
                index.insert(key);
            }
            emit(
                on_progress,
                SyncProgress::WouldCreate {
                    issue_id: issue.id,
                    issue_ref: issue.number,
                    subject: issue.subject.clone(),
                },
            );
            continue;
        }

        match target.create_user_story(&payload).await {
            Ok(story) => {
                tracing::debug!(
                    issue_id = issue.id,
                    story_id = story.id,
                    story_ref = story.reference,
                    "Created story"
                );
                result.created += 1;
                if let (Some(index), Some(key)) = (index.as_mut(), key) {
                    index.insert(key);
                }
                emit(
                    on_progress,
                    SyncProgress::StoryCreated {
                        issue_id: issue.id,
                        issue_ref: issue.number,
                        story_id: story.id,
                        story_ref: story.reference,
                        subject: issue.subject.clone(),
                    },
                );
            }
            Err(cause) => {
                if let Some(expired) = AuthenticationError::expired_from(&cause) {
                    return Err(expired.into());
                }

                let error = LinkCreationError {
                    issue_id: issue.id,
                    issue_ref: issue.number,
                    subject: issue.subject.clone(),
                    cause,
                };
                tracing::warn!(
                    issue_id = issue.id,
                    transient = error.cause.is_transient(),
                    error = %error,
                    "Story creation failed"
                );
                emit(
                    on_progress,
                    SyncProgress::LinkFailed {
                        issue_id: issue.id,
                        issue_ref: issue.number,
                        subject: issue.subject.clone(),
                        error: short_error_message(&error.cause),
                    },
                );
                result.failures.push(error);
            }
        }
    }

    emit(
        on_progress,
        SyncProgress::LinkingComplete {
            created: result.created,
            skipped: result.skipped,
            failed: result.failures.len(),
        },
    );

    Ok(result)
}
