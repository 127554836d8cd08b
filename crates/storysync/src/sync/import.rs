//! Import of issues from another tracker, below a numeric cutoff.
//!
//! Issues numbered at or above the cutoff belong to a live integration and
//! are left alone. The rest become stories carrying an external reference
//! back to the issue URL.

use super::link::{LinkMode, run_linker};
use super::progress::ProgressCallback;
use super::types::{CancellationFlag, ImportOptions, LinkResult};
use crate::error::Result;
use crate::platform::{IssueSource, StoryTarget};

/// Import issues from `source` as stories on `target`.
pub async fn import_issues<S, T>(
    source: &S,
    target: &T,
    options: &ImportOptions,
    cancel: &CancellationFlag,
    on_progress: Option<&ProgressCallback>,
) -> Result<LinkResult>
where
    S: IssueSource + ?Sized,
    T: StoryTarget + ?Sized,
{
    let issues = source.list_issues(on_progress).await?;
    tracing::debug!(
        total = issues.len(),
        cutoff = options.cutoff,
        provider = source.provider(),
        "Importing issues"
    );

    run_linker(
        target,
        issues,
        LinkMode::Import {
            cutoff: options.cutoff,
            include_pull_requests: options.include_pull_requests,
            provider: source.provider(),
        },
        options.dry_run,
        options.verify,
        cancel,
        on_progress,
    )
    .await
}
