use console::Term;
use storysync::client::ApiClient;
use storysync::github::{GitHubClient, IssueState};
use storysync::rate_limits;
use storysync::sync::{CancellationFlag, ImportOptions, import_issues};

use crate::JobOptions;
use crate::commands::shared::{
    Outcome, Summary, finish_run, login_taiga, maybe_rate_limiter, reporter, session,
};
use crate::config::Config;

/// Flags for the import command.
pub(crate) struct ImportFlags {
    pub(crate) cutoff: Option<u64>,
    pub(crate) no_verify: bool,
    pub(crate) include_pull_requests: bool,
}

/// Build the GitHub client from config.
fn github_client(config: &Config) -> Result<GitHubClient, Box<dyn std::error::Error>> {
    let (owner, repo) = config.github_repository()?;
    let state: IssueState = config.github.state.parse()?;

    let api = ApiClient::new(&config.github.url, config.http.timeout())?
        .with_rate_limiter(maybe_rate_limiter(config, rate_limits::GITHUB_DEFAULT_RPS));
    let mut client = GitHubClient::new(api, owner, repo).with_state(state);
    if let Some(token) = config.github.token.as_deref().filter(|t| !t.is_empty()) {
        client = client.with_token(token);
    }
    Ok(client)
}

/// Import GitHub issues numbered below the cutoff as Taiga user stories.
pub(crate) async fn handle_import(
    opts: JobOptions,
    flags: ImportFlags,
    config: &Config,
    cancel: &CancellationFlag,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    // Everything that can be checked offline is checked before logging in
    let cutoff = config.import_cutoff(flags.cutoff)?;
    let github = github_client(config)?;

    let options = ImportOptions {
        include_pull_requests: flags.include_pull_requests || config.github.include_pull_requests,
        dry_run: opts.dry_run,
        verify: !flags.no_verify,
        ..ImportOptions::new(cutoff)
    };

    let is_tty = Term::stdout().is_term();
    if is_tty {
        println!(
            "Importing issues of {} numbered below {}{}\n",
            github.full_name(),
            cutoff,
            if options.dry_run { " (dry run)" } else { "" }
        );
    } else {
        tracing::info!(
            repository = %github.full_name(),
            cutoff,
            dry_run = options.dry_run,
            "Importing issues"
        );
    }

    let taiga = session(login_taiga(config).await?, options.dry_run);

    let (reporter, callback) = reporter();
    let result = import_issues(&github, &taiga, &options, cancel, Some(&callback)).await;
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            reporter.finish();
            return Err(e.into());
        }
    };

    let summary = Summary::from_link("Import", options.dry_run, &result);
    Ok(finish_run(&reporter, &summary, opts.strict))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_client_requires_repository() {
        let config = Config::default();
        let err = github_client(&config).unwrap_err();
        assert!(err.to_string().contains("github.owner"));
    }

    #[test]
    fn test_github_client_rejects_unknown_state() {
        let mut config = Config::default();
        config.github.owner = Some("lago-project".to_string());
        config.github.repo = Some("lago".to_string());
        config.github.state = "merged".to_string();

        let err = github_client(&config).unwrap_err();
        assert!(err.to_string().contains("merged"));
    }

    #[test]
    fn test_github_client_from_config() {
        let mut config = Config::default();
        config.github.owner = Some("lago-project".to_string());
        config.github.repo = Some("lago".to_string());
        config.github.state = "all".to_string();

        let client = github_client(&config).expect("client");
        assert_eq!(client.full_name(), "lago-project/lago");
    }
}
