//! storysync CLI - keep Taiga user stories in step with tracker issues.

mod commands;
mod config;
mod credentials;
mod progress;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::{Term, style};
use storysync::sync::CancellationFlag;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "storysync")]
#[command(version)]
#[command(about = "Reconcile tracker issues with Taiga user stories")]
#[command(
    long_about = "storysync links Taiga issues to user stories, imports GitHub issues below \
a numeric cutoff as user stories, and sweeps duplicate stories that point at the same \
issue. Every job is safe to re-run: work already done is detected and skipped."
)]
#[command(after_long_help = r#"EXAMPLES
    Create a story for every issue that has none:
        $ storysync link

    Import GitHub issues numbered below 159:
        $ storysync import --cutoff 159

    See which duplicate stories would be deleted:
        $ storysync sweep --dry-run

    Fail the run (exit code 2) if any single item failed:
        $ storysync sweep --strict

CONFIGURATION
    storysync reads configuration from:
      1. ~/.config/storysync/config.toml (or $XDG_CONFIG_HOME/storysync/config.toml)
      2. ./storysync.toml
      3. Environment variables (STORYSYNC__SECTION__KEY, e.g., STORYSYNC__TAIGA__PROJECT_ID)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    STORYSYNC_TAIGA_PASSWORD        Taiga password (prompted for when unset)
    STORYSYNC__TAIGA__URL           Taiga API URL (default: https://api.taiga.io/api/v1)
    STORYSYNC__TAIGA__PROJECT_ID    Taiga project id
    STORYSYNC__TAIGA__USERNAME      Taiga username
    STORYSYNC__GITHUB__TOKEN        GitHub personal access token
    STORYSYNC__IMPORT__CUTOFF       Import cutoff issue number
    RUST_LOG                        Log filter for non-interactive runs

EXIT STATUS
    0    The run completed (per-item failures are listed in the summary)
    1    Fatal error: configuration, login, session expiry or a failed fetch
    2    --strict was given and at least one item failed
    130  Interrupted with Ctrl+C (once: stopped after the current item, twice: at once)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a user story for every Taiga issue that has none
    Link {
        #[command(flatten)]
        opts: JobOptions,

        /// Trust the issue's own story count instead of also checking fetched stories
        #[arg(long)]
        no_verify: bool,
    },
    /// Import GitHub issues below the cutoff as Taiga user stories
    #[cfg(feature = "github")]
    Import {
        /// Import issues numbered strictly below this (default from config, required)
        #[arg(short = 'c', long)]
        cutoff: Option<u64>,

        #[command(flatten)]
        opts: JobOptions,

        /// Do not check already imported URLs among fetched stories
        #[arg(long)]
        no_verify: bool,

        /// Import pull requests as well as issues
        #[arg(long)]
        include_pull_requests: bool,
    },
    /// Delete user stories duplicating an earlier story for the same issue
    Sweep {
        #[command(flatten)]
        opts: JobOptions,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Options shared by every job.
#[derive(Debug, Clone, Copy, clap::Args)]
struct JobOptions {
    /// Dry run - show what would be done without making changes
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Exit with code 2 if any item failed
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cancel = CancellationFlag::new();
    shutdown::setup_shutdown_handler(cancel.clone());

    // Initialize tracing for non-TTY mode (structured logging)
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("storysync=info,storysync_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();

    match run(cli, &cancel).await {
        Ok(code) => code,
        Err(e) => {
            if Term::stderr().is_term() {
                eprintln!("{} {}", style("Error:").red().bold(), e);
            } else {
                tracing::error!(error = %e, "Run failed");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, cancel: &CancellationFlag) -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Handle commands that need no configuration first
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    // Load configuration (config file -> env vars -> defaults)
    let config =
        config::Config::load().map_err(|e| format!("Invalid configuration: {}", e))?;

    let outcome = match cli.command {
        Commands::Link { opts, no_verify } => {
            commands::link::handle_link(opts, no_verify, &config, cancel).await?
        }
        #[cfg(feature = "github")]
        Commands::Import {
            cutoff,
            opts,
            no_verify,
            include_pull_requests,
        } => {
            let flags = commands::import::ImportFlags {
                cutoff,
                no_verify,
                include_pull_requests,
            };
            commands::import::handle_import(opts, flags, &config, cancel).await?
        }
        Commands::Sweep { opts } => commands::sweep::handle_sweep(opts, &config, cancel).await?,
        Commands::Completions { .. } | Commands::Man { .. } => return Ok(ExitCode::SUCCESS),
    };

    Ok(outcome.exit_code())
}
