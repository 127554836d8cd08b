use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use storysync::sync::SyncProgress;

/// Consolidated progress state to avoid multiple mutex locks.
#[derive(Default)]
struct ProgressState {
    /// Fetch spinners by collection name.
    fetch_bars: HashMap<String, ProgressBar>,
    /// Bar for the link or sweep phase.
    work_bar: Option<ProgressBar>,
}

/// Interactive progress reporter using indicatif.
///
/// Every per-item decision is printed above the bars so the terminal keeps a
/// record of the run once the bars are gone.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// A reporter that draws nowhere.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden()),
            state: Mutex::new(ProgressState::default()),
        }
    }

    pub fn handle(&self, event: SyncProgress) {
        if let Some(line) = Self::record_line(&event) {
            self.println(line);
        }

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            SyncProgress::FetchingCollection { collection } => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::counter_style());
                pb.set_prefix(format!("{:12}", collection));
                pb.set_message("fetched");
                pb.enable_steady_tick(Duration::from_millis(100));
                state.fetch_bars.insert(collection, pb);
            }

            SyncProgress::FetchedPage {
                collection,
                page,
                total_so_far,
                ..
            } => {
                if let Some(pb) = state.fetch_bars.get(&collection) {
                    pb.set_position(total_so_far as u64);
                    pb.set_message(format!("fetched (page {})", page));
                }
            }

            SyncProgress::FetchComplete { collection, total } => {
                if let Some(pb) = state.fetch_bars.get(&collection) {
                    pb.set_position(total as u64);
                    pb.finish_with_message(format!("✓ {} fetched", total));
                }
            }

            SyncProgress::LinkingIssues {
                count,
                indexed_stories,
                dry_run,
            } => {
                let pb = self.start_work_bar(&mut state, count, "Linking");
                let action = if dry_run { "Checking" } else { "Linking" };
                match indexed_stories {
                    Some(n) => pb.set_message(format!("{}... ({} stories indexed)", action, n)),
                    None => pb.set_message(format!("{}...", action)),
                }
            }

            SyncProgress::IssueSkipped { .. }
            | SyncProgress::StoryCreated { .. }
            | SyncProgress::WouldCreate { .. }
            | SyncProgress::LinkFailed { .. }
            | SyncProgress::StoryDeleted { .. }
            | SyncProgress::WouldDelete { .. }
            | SyncProgress::DeleteFailed { .. } => Self::tick(&state),

            SyncProgress::LinkingComplete {
                created,
                skipped,
                failed,
            } => {
                if let Some(ref pb) = state.work_bar {
                    pb.finish_with_message(format!(
                        "✓ {} created, {} skipped, {} failed",
                        created, skipped, failed
                    ));
                }
            }

            SyncProgress::SweepPlanned {
                total,
                groups,
                duplicates,
                dry_run,
                ..
            } => {
                let pb = self.start_work_bar(&mut state, duplicates, "Sweeping");
                let action = if dry_run { "Checking" } else { "Deleting" };
                pb.set_message(format!(
                    "{} {} duplicates ({} stories, {} groups)",
                    action, duplicates, total, groups
                ));
            }

            SyncProgress::DeletingStory { story_ref, .. } => {
                if let Some(ref pb) = state.work_bar {
                    pb.set_message(format!("story #{}", story_ref));
                }
            }

            SyncProgress::SweepComplete { deleted, failed } => {
                if let Some(ref pb) = state.work_bar {
                    pb.finish_with_message(format!("✓ {} deleted, {} failed", deleted, failed));
                }
            }

            SyncProgress::Cancelled { remaining } => {
                if let Some(ref pb) = state.work_bar {
                    pb.abandon_with_message(format!("cancelled, {} left", remaining));
                }
            }

            _ => {}
        }
    }

    /// The line printed above the bars for an event, if it is one that must
    /// stay on screen after the run: every per-item decision and outcome.
    fn record_line(event: &SyncProgress) -> Option<String> {
        let line = match event {
            SyncProgress::IssueSkipped {
                issue_ref,
                subject,
                reason,
                ..
            } => format!(
                "  {} #{} {} (skipped: {})",
                style("·").dim(),
                issue_ref,
                subject,
                reason
            ),

            SyncProgress::StoryCreated {
                issue_ref,
                story_ref,
                subject,
                ..
            } => format!(
                "  {} #{} {} → story #{}",
                style("+").green().bold(),
                issue_ref,
                subject,
                story_ref
            ),

            SyncProgress::WouldCreate {
                issue_ref, subject, ..
            } => format!(
                "  {} #{} {} (would create)",
                style("~").cyan(),
                issue_ref,
                subject
            ),

            SyncProgress::LinkFailed {
                issue_ref,
                subject,
                error,
                ..
            } => format!(
                "  {} #{} {}: {}",
                style("✗").red().bold(),
                issue_ref,
                subject,
                error
            ),

            SyncProgress::DeletingStory {
                story_ref,
                subject,
                generated_from_issue,
                ..
            } => format!(
                "  {} story #{} {} (duplicate of issue {})",
                style("-").yellow(),
                story_ref,
                subject,
                generated_from_issue
            ),

            SyncProgress::StoryDeleted { story_ref, .. } => {
                format!("  {} deleted story #{}", style("✓").green(), story_ref)
            }

            SyncProgress::WouldDelete {
                story_ref,
                subject,
                generated_from_issue,
                ..
            } => format!(
                "  {} story #{} {} (duplicate of issue {}, would delete)",
                style("~").cyan(),
                story_ref,
                subject,
                generated_from_issue
            ),

            SyncProgress::DeleteFailed {
                story_ref,
                generated_from_issue,
                error,
                ..
            } => format!(
                "  {} story #{} (issue {}): {}",
                style("✗").red().bold(),
                story_ref,
                generated_from_issue,
                error
            ),

            _ => return None,
        };
        Some(line)
    }

    fn start_work_bar(&self, state: &mut ProgressState, len: usize, prefix: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new(len as u64));
        pb.set_style(Self::bar_style());
        pb.set_prefix(format!("{:12}", prefix));
        state.work_bar = Some(pb.clone());
        pb
    }

    fn tick(state: &ProgressState) {
        if let Some(ref pb) = state.work_bar {
            pb.inc(1);
        }
    }

    fn println(&self, line: String) {
        self.multi.println(line).ok();
    }

    pub fn finish(&self) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for pb in state.fetch_bars.values() {
            if !pb.is_finished() {
                pb.finish();
            }
        }
        if let Some(ref pb) = state.work_bar
            && !pb.is_finished()
        {
            pb.finish();
        }
    }

    fn counter_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {pos:>4} {msg}")
            .expect("Invalid template")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .expect("Invalid template")
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
