//! Progress reporting types for the batch jobs.
//!
//! Jobs never print. Every phase transition and per-item decision is emitted
//! as a [`SyncProgress`] event; the CLI decides how to render it.

use std::fmt;

/// Why an issue was not turned into a story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The source tracker reports a generated story already.
    AlreadyLinked,
    /// A story referencing this issue was found among the fetched stories.
    ExistingStory,
    /// The issue number is at or above the import cutoff.
    AboveCutoff { cutoff: u64 },
    /// GitHub pull request, excluded from import.
    PullRequest,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyLinked => f.write_str("already has user story"),
            SkipReason::ExistingStory => f.write_str("existing story found"),
            SkipReason::AboveCutoff { cutoff } => write!(f, "at or above cutoff {}", cutoff),
            SkipReason::PullRequest => f.write_str("pull request"),
        }
    }
}

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// Starting to fetch a collection.
    FetchingCollection {
        /// Collection name ("issues", "userstories").
        collection: String,
    },

    /// Fetched a page of a collection.
    FetchedPage {
        collection: String,
        /// Page number (1-indexed).
        page: u32,
        /// Number of items on this page.
        count: usize,
        /// Running total of items fetched so far.
        total_so_far: usize,
    },

    /// Finished fetching a collection.
    FetchComplete { collection: String, total: usize },

    /// Starting to link issues to stories.
    LinkingIssues {
        /// Number of issues to consider.
        count: usize,
        /// Number of stories indexed for local verification (if enabled).
        indexed_stories: Option<usize>,
        dry_run: bool,
    },

    /// An issue was skipped.
    IssueSkipped {
        issue_id: i64,
        issue_ref: u64,
        subject: String,
        reason: SkipReason,
    },

    /// A story was created for an issue.
    StoryCreated {
        issue_id: i64,
        issue_ref: u64,
        story_id: i64,
        story_ref: u64,
        subject: String,
    },

    /// Dry run: a story would have been created.
    WouldCreate {
        issue_id: i64,
        issue_ref: u64,
        subject: String,
    },

    /// Creating the story for an issue failed.
    LinkFailed {
        issue_id: i64,
        issue_ref: u64,
        subject: String,
        error: String,
    },

    /// Linking phase complete.
    LinkingComplete {
        created: usize,
        skipped: usize,
        failed: usize,
    },

    /// Duplicate plan computed.
    SweepPlanned {
        /// Stories fetched.
        total: usize,
        /// Distinct non-null back-references.
        groups: usize,
        /// Stories marked for deletion.
        duplicates: usize,
        /// Stories without a back-reference.
        unlinked: usize,
        dry_run: bool,
    },

    /// About to delete a duplicate story.
    DeletingStory {
        story_id: i64,
        story_ref: u64,
        subject: String,
        generated_from_issue: i64,
    },

    /// A duplicate story was deleted.
    StoryDeleted {
        story_id: i64,
        story_ref: u64,
        generated_from_issue: i64,
    },

    /// Dry run: a story would have been deleted.
    WouldDelete {
        story_id: i64,
        story_ref: u64,
        subject: String,
        generated_from_issue: i64,
    },

    /// Deleting a duplicate story failed.
    DeleteFailed {
        story_id: i64,
        story_ref: u64,
        generated_from_issue: i64,
        error: String,
    },

    /// Sweep phase complete.
    SweepComplete { deleted: usize, failed: usize },

    /// The run was cancelled between items.
    Cancelled {
        /// Items not processed.
        remaining: usize,
    },
}

/// Callback for progress updates during sync operations.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
