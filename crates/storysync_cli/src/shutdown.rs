use console::Term;
use storysync::sync::CancellationFlag;

use crate::commands::shared::INTERRUPTED_EXIT_CODE;

/// Set up the Ctrl+C handler.
///
/// The first Ctrl+C cancels the running job before its next item; the job
/// then ends with code 130. A second one exits immediately with the same code.
pub(crate) fn setup_shutdown_handler(cancel: CancellationFlag) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }

        let is_tty = Term::stdout().is_term();
        if is_tty {
            eprintln!("\n\nCancelling, finishing the current request...");
            eprintln!("Press Ctrl+C again to force quit.");
        } else {
            tracing::warn!("Cancellation requested, finishing the current request");
        }

        cancel.cancel();

        // Wait for second Ctrl+C for force quit
        if tokio::signal::ctrl_c().await.is_ok() {
            if is_tty {
                eprintln!("Force quit!");
            }
            std::process::exit(i32::from(INTERRUPTED_EXIT_CODE));
        }
    });
}
