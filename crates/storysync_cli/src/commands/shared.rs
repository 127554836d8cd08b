use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use console::style;
use storysync::client::ApiClient;
use storysync::sync::{LinkResult, SweepResult};
use storysync::taiga::TaigaClient;
use storysync::{ApiRateLimiter, rate_limits, short_error_message};

use crate::config::Config;
use crate::credentials::PromptCredentials;
use crate::progress::ProgressReporter;

/// Failures shown in full before the rest are counted.
const MAX_DISPLAYED_FAILURES: usize = 10;

/// Exit code for a run stopped by Ctrl+C, whether after the current item
/// or at once.
pub(crate) const INTERRUPTED_EXIT_CODE: u8 = 130;

/// How a finished run maps to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Every item succeeded, or failures were tolerated.
    Success,
    /// `--strict` was given and at least one item failed.
    ItemFailures,
    /// The run stopped early on Ctrl+C.
    Cancelled,
}

impl Outcome {
    /// A cancelled run is never reported as complete, strict or not.
    pub(crate) fn from_run(failed: usize, cancelled: bool, strict: bool) -> Self {
        if cancelled {
            Outcome::Cancelled
        } else if strict && failed > 0 {
            Outcome::ItemFailures
        } else {
            Outcome::Success
        }
    }

    pub(crate) fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::ItemFailures => ExitCode::from(2),
            Outcome::Cancelled => ExitCode::from(INTERRUPTED_EXIT_CODE),
        }
    }
}

/// Create a rate limiter for the configured pace.
/// Returns None when pacing is disabled with 0.
pub(crate) fn maybe_rate_limiter(config: &Config, default_rps: u32) -> Option<ApiRateLimiter> {
    ApiRateLimiter::from_config(config.http.rps_or(default_rps))
}

/// Unauthenticated Taiga client with the configured timeout and pace.
pub(crate) fn taiga_api(config: &Config) -> Result<ApiClient, Box<dyn Error>> {
    Ok(ApiClient::new(&config.taiga.url, config.http.timeout())?
        .with_rate_limiter(maybe_rate_limiter(config, rate_limits::TAIGA_DEFAULT_RPS)))
}

/// Log in to Taiga for the configured project.
pub(crate) async fn login_taiga(config: &Config) -> Result<TaigaClient, Box<dyn Error>> {
    let project_id = config.project_id()?;
    let api = taiga_api(config)?;
    let credentials = PromptCredentials::new(config.taiga.username.clone());

    let taiga = TaigaClient::login(api, project_id, &credentials).await?;
    tracing::debug!(project_id, url = %config.taiga.url, "Logged in to Taiga");
    Ok(taiga)
}

/// Dry runs keep the session but lose the ability to write.
pub(crate) fn session(taiga: TaigaClient, dry_run: bool) -> TaigaClient {
    if dry_run {
        taiga.into_read_only()
    } else {
        taiga
    }
}

/// Create the progress reporter and its library callback.
pub(crate) fn reporter() -> (Arc<ProgressReporter>, storysync::sync::ProgressCallback) {
    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();
    (reporter, callback)
}

/// One failed item, with the identifiers needed to find it by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FailureLine {
    pub(crate) item: String,
    pub(crate) error: String,
}

/// What a job did, in its own terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Counts {
    Link { created: usize, skipped: usize },
    Sweep { deleted: usize, unlinked: usize },
}

impl Default for Counts {
    fn default() -> Self {
        Counts::Link {
            created: 0,
            skipped: 0,
        }
    }
}

/// End-of-run counts for display.
#[derive(Debug, Default)]
pub(crate) struct Summary {
    pub(crate) title: &'static str,
    pub(crate) dry_run: bool,
    pub(crate) counts: Counts,
    pub(crate) failures: Vec<FailureLine>,
    pub(crate) cancelled: bool,
}

impl Summary {
    pub(crate) fn from_link(title: &'static str, dry_run: bool, result: &LinkResult) -> Self {
        Self {
            title,
            dry_run,
            counts: Counts::Link {
                created: if dry_run {
                    result.would_create
                } else {
                    result.created
                },
                skipped: result.skipped,
            },
            failures: result
                .failures
                .iter()
                .map(|f| FailureLine {
                    item: format!("issue #{} (id {}) {}", f.issue_ref, f.issue_id, f.subject),
                    error: short_error_message(&f.cause),
                })
                .collect(),
            cancelled: result.cancelled,
        }
    }

    pub(crate) fn from_sweep(dry_run: bool, result: &SweepResult) -> Self {
        Self {
            title: "Sweep",
            dry_run,
            counts: Counts::Sweep {
                deleted: if dry_run {
                    result.would_delete
                } else {
                    result.deleted
                },
                unlinked: result.unlinked,
            },
            failures: result
                .failures
                .iter()
                .map(|f| FailureLine {
                    item: match f.generated_from_issue {
                        Some(issue) => format!(
                            "story #{} (id {}, issue {})",
                            f.story_ref, f.story_id, issue
                        ),
                        None => format!("story #{} (id {})", f.story_ref, f.story_id),
                    },
                    error: short_error_message(&f.cause),
                })
                .collect(),
            cancelled: result.cancelled,
        }
    }

    pub(crate) fn failed(&self) -> usize {
        self.failures.len()
    }

    fn counts(&self) -> String {
        let done = match (self.counts, self.dry_run) {
            (Counts::Link { created, skipped }, false) => {
                format!("{} created, {} skipped", created, skipped)
            }
            (Counts::Link { created, skipped }, true) => {
                format!("{} would create, {} skipped", created, skipped)
            }
            (Counts::Sweep { deleted, unlinked }, false) => {
                format!("{} deleted, {} kept without issue link", deleted, unlinked)
            }
            (Counts::Sweep { deleted, unlinked }, true) => {
                format!("{} would delete, {} kept without issue link", deleted, unlinked)
            }
        };
        format!("{}, {} failed", done, self.failed())
    }
}

/// Display the summary and each failure to the user.
pub(crate) fn display_summary(summary: &Summary, is_tty: bool) {
    let total = summary.failed();
    let display_count = std::cmp::min(MAX_DISPLAYED_FAILURES, total);

    if is_tty {
        println!();
        let mark = if total == 0 {
            style("✓").green().bold()
        } else {
            style("⚠").yellow().bold()
        };
        println!("{} {}: {}", mark, summary.title, summary.counts());
        if summary.cancelled {
            println!(
                "{} Cancelled before all items were processed",
                style("⚠").yellow()
            );
        }
        if total > 0 {
            eprintln!("{} ({} total):", style("Failures").yellow().bold(), total);
            for failure in summary.failures.iter().take(display_count) {
                eprintln!("  - {}: {}", failure.item, failure.error);
            }
            if total > display_count {
                eprintln!("  ... and {} more failures", total - display_count);
            }
        }
    } else {
        match summary.counts {
            Counts::Link { created, skipped } => tracing::info!(
                job = summary.title,
                dry_run = summary.dry_run,
                created,
                skipped,
                failed = total,
                cancelled = summary.cancelled,
                "Run complete"
            ),
            Counts::Sweep { deleted, unlinked } => tracing::info!(
                job = summary.title,
                dry_run = summary.dry_run,
                deleted,
                unlinked,
                failed = total,
                cancelled = summary.cancelled,
                "Run complete"
            ),
        }
        for failure in summary.failures.iter().take(display_count) {
            tracing::error!(item = %failure.item, error = %failure.error, "Item failed");
        }
        if total > display_count {
            tracing::error!(
                additional_failures = total - display_count,
                "Additional items failed"
            );
        }
    }
}

/// Display the summary and decide the exit code.
pub(crate) fn finish_run(
    reporter: &ProgressReporter,
    summary: &Summary,
    strict: bool,
) -> Outcome {
    reporter.finish();
    display_summary(summary, console::Term::stdout().is_term());
    Outcome::from_run(summary.failed(), summary.cancelled, strict)
}
