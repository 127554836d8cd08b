//! Configuration file support for storysync.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (`STORYSYNC__SECTION__KEY`, e.g. `STORYSYNC__TAIGA__PROJECT_ID`)
//! 3. Config file (./storysync.toml, then ~/.config/storysync/config.toml)
//! 4. Built-in defaults
//!
//! Passwords are never read from here. See [`crate::credentials`].
//!
//! Example config file:
//! ```toml
//! [taiga]
//! url = "https://api.taiga.io/api/v1"  # optional, this is the default
//! project_id = 114180
//! username = "sync-bot"
//!
//! [github]
//! owner = "lago-project"
//! repo = "lago"
//! token = "ghp_..."  # or use STORYSYNC__GITHUB__TOKEN
//! state = "all"
//!
//! [import]
//! cutoff = 159
//!
//! [http]
//! timeout_secs = 10
//! requests_per_second = 5  # 0 disables client-side pacing
//!
//! [sweep]
//! dry_run = true
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::builder::DefaultState;
use config::{
    Config as ConfigBuilder, ConfigBuilder as Builder, ConfigError, Environment, File, FileFormat,
};
use directories::ProjectDirs;
use serde::Deserialize;

/// Environment variable prefix. Keys are nested with a double underscore so
/// that field names like `project_id` stay intact.
pub const ENV_PREFIX: &str = "STORYSYNC";
const ENV_SEPARATOR: &str = "__";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Taiga configuration.
    pub taiga: TaigaConfig,
    /// GitHub configuration for the import job.
    pub github: GitHubConfig,
    /// Import job settings.
    pub import: ImportConfig,
    /// HTTP client settings.
    pub http: HttpConfig,
    /// Sweep job settings.
    pub sweep: SweepConfig,
}

/// Taiga configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TaigaConfig {
    /// API base URL.
    pub url: String,
    /// Project the jobs operate on.
    pub project_id: Option<i64>,
    /// Login name. Prompted for when unset.
    pub username: Option<String>,
}

impl Default for TaigaConfig {
    fn default() -> Self {
        Self {
            url: storysync::taiga::DEFAULT_API_URL.to_string(),
            project_id: None,
            username: None,
        }
    }
}

/// GitHub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API base URL.
    pub url: String,
    /// Repository owner.
    pub owner: Option<String>,
    /// Repository name.
    pub repo: Option<String>,
    /// API token. Anonymous requests are used when unset.
    pub token: Option<String>,
    /// Issue state filter: open, closed or all.
    pub state: String,
    /// Import pull requests as well as issues.
    pub include_pull_requests: bool,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            url: "https://api.github.com".to_string(),
            owner: None,
            repo: None,
            token: None,
            state: "open".to_string(),
            include_pull_requests: false,
        }
    }
}

/// Import job settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Issues numbered at or above this are not imported. No default.
    pub cutoff: Option<u64>,
}

/// HTTP client settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Client-side pacing. Unset uses the per-provider default, 0 disables it.
    pub requests_per_second: Option<u32>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            requests_per_second: None,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Requests per second for a provider, falling back to `default_rps`.
    pub fn rps_or(&self, default_rps: u32) -> u32 {
        self.requests_per_second.unwrap_or(default_rps)
    }
}

/// Sweep job settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Report duplicates without deleting them.
    pub dry_run: bool,
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/storysync/config.toml)
    /// 3. Local config file (./storysync.toml)
    /// 4. Environment variables with the STORYSYNC__ prefix
    ///
    /// A file or variable that does not parse is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("storysync.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./storysync.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        Self::from_builder(builder.add_source(environment()))
    }

    fn from_builder(builder: Builder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize::<Config>()
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "storysync").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The Taiga project id, or an error naming both ways to set it.
    pub fn project_id(&self) -> Result<i64, String> {
        self.taiga.project_id.ok_or_else(|| {
            "No Taiga project configured. Set taiga.project_id in storysync.toml \
             or STORYSYNC__TAIGA__PROJECT_ID."
                .to_string()
        })
    }

    /// Resolve the import cutoff: the CLI flag wins, then config. There is
    /// no default.
    pub fn import_cutoff(&self, flag: Option<u64>) -> Result<u64, String> {
        flag.or(self.import.cutoff).ok_or_else(|| {
            "No import cutoff given. Pass --cutoff or set import.cutoff.".to_string()
        })
    }

    /// Owner and repository for the import job.
    pub fn github_repository(&self) -> Result<(&str, &str), String> {
        match (self.github.owner.as_deref(), self.github.repo.as_deref()) {
            (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => {
                Ok((owner, repo))
            }
            _ => Err("No GitHub repository configured. Set github.owner and github.repo.".into()),
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}
