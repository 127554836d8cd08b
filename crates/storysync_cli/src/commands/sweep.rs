use console::Term;
use storysync::sync::{CancellationFlag, SweepOptions, sweep_duplicates};

use crate::JobOptions;
use crate::commands::shared::{Outcome, Summary, finish_run, login_taiga, reporter, session};
use crate::config::Config;

/// Delete user stories that duplicate an earlier story for the same issue.
pub(crate) async fn handle_sweep(
    opts: JobOptions,
    config: &Config,
    cancel: &CancellationFlag,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let options = SweepOptions {
        dry_run: opts.dry_run || config.sweep.dry_run,
    };

    let taiga = session(login_taiga(config).await?, options.dry_run);

    if Term::stdout().is_term() && options.dry_run {
        println!("Dry run: no stories will be deleted\n");
    }

    let (reporter, callback) = reporter();
    let result = match sweep_duplicates(&taiga, &options, cancel, Some(&callback)).await {
        Ok(result) => result,
        Err(e) => {
            reporter.finish();
            return Err(e.into());
        }
    };

    let summary = Summary::from_sweep(options.dry_run, &result);
    Ok(finish_run(&reporter, &summary, opts.strict))
}
