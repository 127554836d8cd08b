use console::Term;
use storysync::sync::{CancellationFlag, LinkOptions, link_issues};

use crate::JobOptions;
use crate::commands::shared::{Outcome, Summary, finish_run, login_taiga, reporter, session};
use crate::config::Config;

/// Create a user story for every Taiga issue that has none.
pub(crate) async fn handle_link(
    opts: JobOptions,
    no_verify: bool,
    config: &Config,
    cancel: &CancellationFlag,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let options = LinkOptions {
        dry_run: opts.dry_run,
        verify: !no_verify,
    };
    let taiga = session(login_taiga(config).await?, options.dry_run);
    if Term::stdout().is_term() && options.dry_run {
        println!("Dry run: no stories will be created\n");
    }

    let (reporter, callback) = reporter();
    let result = link_issues(&taiga, &taiga, &options, cancel, Some(&callback)).await;
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            reporter.finish();
            return Err(e.into());
        }
    };

    let summary = Summary::from_link("Link", options.dry_run, &result);
    Ok(finish_run(&reporter, &summary, opts.strict))
}
