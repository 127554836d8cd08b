//! Duplicate story sweep.
//!
//! Stories are grouped by `generated_from_issue`. The first story of each
//! group in fetch order is kept and every later one is deleted, in the order
//! the stories were fetched. Stories with no back-reference are never grouped.

use std::collections::HashMap;

use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::{CancellationFlag, DuplicateGroup, DuplicatePlan, SweepOptions, SweepResult};
use crate::error::{AuthenticationError, DeletionError, Result, short_error_message};
use crate::platform::{StoryTarget, TargetStory};

/// Compute which stories are duplicates.
pub fn plan_duplicates(stories: &[TargetStory]) -> DuplicatePlan {
    let mut plan = DuplicatePlan {
        total: stories.len(),
        ..Default::default()
    };
    let mut positions: HashMap<i64, usize> = HashMap::new();

    for story in stories {
        let Some(issue_id) = story.generated_from_issue else {
            plan.unlinked += 1;
            continue;
        };

        match positions.get(&issue_id) {
            Some(&idx) => {
                plan.groups[idx].duplicates.push(story.clone());
                plan.deletions.push(story.clone());
            }
            None => {
                positions.insert(issue_id, plan.groups.len());
                plan.groups.push(DuplicateGroup {
                    generated_from_issue: issue_id,
                    kept: story.clone(),
                    duplicates: Vec::new(),
                });
            }
        }
    }

    plan
}

/// Fetch every story of the target project and delete duplicates.
///
/// Deletes are independent: one failure is recorded and the sweep moves on.
/// A 401 aborts the run.
pub async fn sweep_duplicates<T: StoryTarget + ?Sized>(
    target: &T,
    options: &SweepOptions,
    cancel: &CancellationFlag,
    on_progress: Option<&ProgressCallback>,
) -> Result<SweepResult> {
    let stories = target.list_user_stories(on_progress).await?;
    let plan = plan_duplicates(&stories);

    let mut result = SweepResult {
        total: plan.total,
        groups: plan.groups.len(),
        unlinked: plan.unlinked,
        duplicates: plan.duplicate_count(),
        ..Default::default()
    };

    tracing::debug!(
        total = result.total,
        groups = result.groups,
        duplicates = result.duplicates,
        unlinked = result.unlinked,
        "Planned sweep"
    );

    emit(
        on_progress,
        SyncProgress::SweepPlanned {
            total: result.total,
            groups: result.groups,
            duplicates: result.duplicates,
            unlinked: result.unlinked,
            dry_run: options.dry_run,
        },
    );

    if plan.is_clean() {
        tracing::debug!("No duplicate stories");
    }

    for story in &plan.deletions {
        if cancel.is_cancelled() {
            let remaining =
                result.duplicates - result.deleted - result.would_delete - result.failures.len();
            tracing::warn!(remaining, "Sweep cancelled");
            result.cancelled = true;
            emit(on_progress, SyncProgress::Cancelled { remaining });
            return Ok(finish(result, on_progress));
        }

        let Some(issue_id) = story.generated_from_issue else {
            continue;
        };

        if options.dry_run {
            result.would_delete += 1;
            emit(
                on_progress,
                SyncProgress::WouldDelete {
                    story_id: story.id,
                    story_ref: story.reference,
                    subject: story.subject.clone(),
                    generated_from_issue: issue_id,
                },
            );
            continue;
        }

        emit(
            on_progress,
            SyncProgress::DeletingStory {
                story_id: story.id,
                story_ref: story.reference,
                subject: story.subject.clone(),
                generated_from_issue: issue_id,
            },
        );

        match target.delete_user_story(story.id).await {
            Ok(()) => {
                tracing::debug!(story_id = story.id, issue_id, "Deleted duplicate story");
                result.deleted += 1;
                emit(
                    on_progress,
                    SyncProgress::StoryDeleted {
                        story_id: story.id,
                        story_ref: story.reference,
                        generated_from_issue: issue_id,
                    },
                );
            }
            Err(cause) => {
                if let Some(expired) = AuthenticationError::expired_from(&cause) {
                    return Err(expired.into());
                }

                let error = DeletionError {
                    story_id: story.id,
                    story_ref: story.reference,
                    generated_from_issue: Some(issue_id),
                    cause,
                };
                tracing::warn!(
                    story_id = story.id,
                    transient = error.cause.is_transient(),
                    error = %error,
                    "Delete failed"
                );
                emit(
                    on_progress,
                    SyncProgress::DeleteFailed {
                        story_id: story.id,
                        story_ref: story.reference,
                        generated_from_issue: issue_id,
                        error: short_error_message(&error.cause),
                    },
                );
                result.failures.push(error);
            }
        }
    }

    Ok(finish(result, on_progress))
}

fn finish(result: SweepResult, on_progress: Option<&ProgressCallback>) -> SweepResult {
    emit(
        on_progress,
        SyncProgress::SweepComplete {
            deleted: result.deleted,
            failed: result.failures.len(),
        },
    );
    result
}
