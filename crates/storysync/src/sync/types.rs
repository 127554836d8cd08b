//! Options, results and cancellation for the batch jobs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{DeletionError, LinkCreationError};
use crate::platform::TargetStory;

/// Shared flag checked before each item of a batch.
///
/// Clones observe the same flag, so a signal handler can hold one while the
/// job holds another.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for the story linker.
#[derive(Debug, Clone)]
pub struct LinkOptions {
    /// Log decisions without creating anything.
    pub dry_run: bool,
    /// Fetch target stories first and skip issues that already have one.
    pub verify: bool,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            verify: true,
        }
    }
}

/// Options for the GitHub import.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Only issues numbered strictly below this are imported.
    pub cutoff: u64,
    pub include_pull_requests: bool,
    pub dry_run: bool,
    /// Fetch target stories first and skip issues whose URL is referenced.
    pub verify: bool,
}

impl ImportOptions {
    /// The cutoff has no default; it must always be given.
    pub fn new(cutoff: u64) -> Self {
        Self {
            cutoff,
            include_pull_requests: false,
            dry_run: false,
            verify: true,
        }
    }
}

/// Options for the duplicate sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    /// Plan and log deletions without sending them.
    pub dry_run: bool,
}

/// Result of a link or import run.
#[derive(Debug, Default)]
pub struct LinkResult {
    /// Issues fetched from the source.
    pub total: usize,
    /// Issues a decision was made for.
    pub processed: usize,
    /// Stories created.
    pub created: usize,
    /// Stories that would have been created (dry run).
    pub would_create: usize,
    /// Issues skipped, for any reason.
    pub skipped: usize,
    /// Per-item failures (non-fatal).
    pub failures: Vec<LinkCreationError>,
    /// Whether the run stopped early on cancellation.
    pub cancelled: bool,
}

/// One back-reference value and the stories that carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub generated_from_issue: i64,
    /// First story seen in fetch order.
    pub kept: TargetStory,
    /// Every later story, in fetch order.
    pub duplicates: Vec<TargetStory>,
}

/// What a sweep will delete, computed without side effects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicatePlan {
    /// Stories considered.
    pub total: usize,
    /// Stories with no back-reference. Never deleted.
    pub unlinked: usize,
    /// One entry per distinct back-reference, in first-seen order.
    pub groups: Vec<DuplicateGroup>,
    /// Every duplicate across all groups, in fetch order. Deletes follow
    /// this order.
    pub deletions: Vec<TargetStory>,
}

impl DuplicatePlan {
    pub fn duplicate_count(&self) -> usize {
        self.deletions.len()
    }

    /// Whether every back-reference is carried by exactly one story.
    pub fn is_clean(&self) -> bool {
        self.deletions.is_empty()
    }
}

/// Result of a sweep.
#[derive(Debug, Default)]
pub struct SweepResult {
    /// Stories fetched.
    pub total: usize,
    /// Distinct non-null back-references.
    pub groups: usize,
    /// Stories without a back-reference.
    pub unlinked: usize,
    /// Stories marked as duplicates.
    pub duplicates: usize,
    pub deleted: usize,
    /// Stories that would have been deleted (dry run).
    pub would_delete: usize,
    /// Per-item failures (non-fatal).
    pub failures: Vec<DeletionError>,
    pub cancelled: bool,
}
