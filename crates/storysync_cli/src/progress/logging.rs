use storysync::sync::SyncProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::FetchingCollection { collection } => {
                tracing::info!(collection = %collection, "Fetching collection");
            }

            SyncProgress::FetchedPage {
                collection,
                page,
                count,
                total_so_far,
            } => {
                tracing::debug!(collection = %collection, page, count, total_so_far, "Fetched page");
            }

            SyncProgress::FetchComplete { collection, total } => {
                tracing::info!(collection = %collection, total, "Fetch complete");
            }

            SyncProgress::LinkingIssues {
                count,
                indexed_stories,
                dry_run,
            } => {
                tracing::info!(count, indexed_stories = ?indexed_stories, dry_run, "Linking issues");
            }

            SyncProgress::IssueSkipped {
                issue_id,
                issue_ref,
                subject,
                reason,
            } => {
                tracing::info!(issue_id, issue_ref, subject = %subject, reason = %reason, "Skipped issue");
            }

            SyncProgress::StoryCreated {
                issue_id,
                issue_ref,
                story_id,
                story_ref,
                subject,
            } => {
                tracing::info!(
                    issue_id,
                    issue_ref,
                    story_id,
                    story_ref,
                    subject = %subject,
                    "Created user story"
                );
            }

            SyncProgress::WouldCreate {
                issue_id,
                issue_ref,
                subject,
            } => {
                tracing::info!(issue_id, issue_ref, subject = %subject, "Would create user story");
            }

            SyncProgress::LinkFailed {
                issue_id,
                issue_ref,
                subject,
                error,
            } => {
                tracing::warn!(issue_id, issue_ref, subject = %subject, error = %error, "Failed to create user story");
            }

            SyncProgress::LinkingComplete {
                created,
                skipped,
                failed,
            } => {
                tracing::info!(created, skipped, failed, "Linking complete");
            }

            SyncProgress::SweepPlanned {
                total,
                groups,
                duplicates,
                unlinked,
                dry_run,
            } => {
                tracing::info!(total, groups, duplicates, unlinked, dry_run, "Planned sweep");
            }

            SyncProgress::DeletingStory {
                story_id,
                story_ref,
                subject,
                generated_from_issue,
            } => {
                tracing::info!(
                    story_id,
                    story_ref,
                    subject = %subject,
                    generated_from_issue,
                    "Deleting duplicate story"
                );
            }

            SyncProgress::StoryDeleted {
                story_id,
                story_ref,
                generated_from_issue,
            } => {
                tracing::info!(story_id, story_ref, generated_from_issue, "Deleted duplicate story");
            }

            SyncProgress::WouldDelete {
                story_id,
                story_ref,
                subject,
                generated_from_issue,
            } => {
                tracing::info!(
                    story_id,
                    story_ref,
                    subject = %subject,
                    generated_from_issue,
                    "Would delete duplicate story"
                );
            }

            SyncProgress::DeleteFailed {
                story_id,
                story_ref,
                generated_from_issue,
                error,
            } => {
                tracing::warn!(story_id, story_ref, generated_from_issue, error = %error, "Failed to delete story");
            }

            SyncProgress::SweepComplete { deleted, failed } => {
                tracing::info!(deleted, failed, "Sweep complete");
            }

            SyncProgress::Cancelled { remaining } => {
                tracing::warn!(remaining, "Cancelled");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
