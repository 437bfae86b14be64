//! Configuration file support for forgepulse.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `FORGEPULSE_`, sections split by `__`,
//!    e.g. `FORGEPULSE_ACTIVITY__WINDOW_DAYS`)
//! 3. Local config file (./forgepulse.toml)
//! 4. XDG config file (~/.config/forgepulse/config.toml)
//! 5. Built-in defaults
//!
//! `GITHUB_TOKEN` and `TARGET_ORGANIZATIONS` are honoured when the
//! corresponding settings are not configured anywhere else.
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."  # or use GITHUB_TOKEN
//!
//! [activity]
//! organizations = "acme,initech"  # "all" (default) or a comma-separated list
//! window_days = 7
//! repo_fetch_limit = 25
//! commits_per_repo = 100   # default-branch history in the dashboard batch
//! pr_limit = 20
//! max_pages = 50
//! max_batch_repos = 5      # repositories per commit-stream batch
//! commit_budget = 100      # commits shared across a commit-stream batch
//! per_repo_cap = 10
//! branches_per_repo = 10
//! stream_scan_limit = 30
//! memo_ttl_secs = 300
//!
//! [snapshot]
//! path = "github_data.json"
//! prefer = false  # read the snapshot before touching the network
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use forgepulse::options::{
    BATCH_TIMEOUT, COMMITS_PER_REPO_CAP, DEFAULT_BRANCHES_PER_REPO, DEFAULT_COMMIT_BUDGET,
    DEFAULT_COMMITS_PER_REPO, DEFAULT_MAX_PAGES, DEFAULT_MEMO_TTL, DEFAULT_PR_LIMIT,
    DEFAULT_REPO_FETCH_LIMIT, DEFAULT_SNAPSHOT_FILE, DEFAULT_STREAM_SCAN_LIMIT,
    DEFAULT_WINDOW_DAYS, DISCOVERY_TIMEOUT, MAX_REPOS_FOR_COMMIT_STREAM,
};
use forgepulse::{DataMode, OrgScope, PulseOptions};
use serde::Deserialize;

/// Legacy variable holding the GitHub credential.
const TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Legacy variable holding the organization list.
const ORGANIZATIONS_ENV: &str = "TARGET_ORGANIZATIONS";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub activity: ActivityConfig,
    pub snapshot: SnapshotConfig,
}

/// GitHub configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Personal access token.
    pub token: Option<String>,
}

/// What a cycle fetches.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// `"all"` or a comma-separated list of organization logins.
    pub organizations: Option<String>,
    pub window_days: i64,
    pub repo_fetch_limit: usize,
    pub commits_per_repo: usize,
    pub pr_limit: usize,
    pub max_pages: u32,
    /// Commit-stream batch size cap.
    pub max_batch_repos: usize,
    pub commit_budget: usize,
    pub per_repo_cap: usize,
    pub branches_per_repo: usize,
    pub stream_scan_limit: usize,
    pub memo_ttl_secs: u64,
    pub discovery_timeout_secs: u64,
    pub batch_timeout_secs: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            organizations: None,
            window_days: DEFAULT_WINDOW_DAYS,
            repo_fetch_limit: DEFAULT_REPO_FETCH_LIMIT,
            commits_per_repo: DEFAULT_COMMITS_PER_REPO,
            pr_limit: DEFAULT_PR_LIMIT,
            max_pages: DEFAULT_MAX_PAGES,
            max_batch_repos: MAX_REPOS_FOR_COMMIT_STREAM,
            commit_budget: DEFAULT_COMMIT_BUDGET,
            per_repo_cap: COMMITS_PER_REPO_CAP,
            branches_per_repo: DEFAULT_BRANCHES_PER_REPO,
            stream_scan_limit: DEFAULT_STREAM_SCAN_LIMIT,
            memo_ttl_secs: DEFAULT_MEMO_TTL.as_secs(),
            discovery_timeout_secs: DISCOVERY_TIMEOUT.as_secs(),
            batch_timeout_secs: BATCH_TIMEOUT.as_secs(),
        }
    }
}

/// Snapshot file settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub path: PathBuf,
    /// Serve from the snapshot when it has data.
    pub prefer: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            prefer: false,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/forgepulse/config.toml)
    /// 3. Local config file (./forgepulse.toml)
    /// 4. Environment variables with FORGEPULSE_ prefix
    /// 5. Legacy environment variables, only where nothing else was set
    pub fn load() -> Self {
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

        let local_config = PathBuf::from("forgepulse.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./forgepulse.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // FORGEPULSE_ACTIVITY__WINDOW_DAYS -> activity.window_days
        builder = builder.add_source(
            Environment::with_prefix("FORGEPULSE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config = match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        };

        config.apply_legacy_env(|key| std::env::var(key).ok());
        config
    }

    fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.github.token.is_none() {
            self.github.token = lookup(TOKEN_ENV).filter(|t| !t.trim().is_empty());
        }
        if self.activity.organizations.is_none() {
            self.activity.organizations = lookup(ORGANIZATIONS_ENV);
        }
    }

    /// The GitHub token, if any.
    pub fn github_token(&self) -> Option<&str> {
        self.github.token.as_deref()
    }

    /// Organization scope. Absent means every organization.
    pub fn org_scope(&self) -> OrgScope {
        self.activity
            .organizations
            .as_deref()
            .map(OrgScope::parse_list)
            .unwrap_or_default()
    }

    /// Pipeline options built from this configuration.
    pub fn pulse_options(&self) -> PulseOptions {
        PulseOptions {
            org_scope: self.org_scope(),
            window_days: self.activity.window_days,
            repo_fetch_limit: self.activity.repo_fetch_limit,
            commits_per_repo: self.activity.commits_per_repo,
            pr_limit: self.activity.pr_limit,
            max_pages: self.activity.max_pages,
            max_batch_repos: self.activity.max_batch_repos,
            commit_budget: self.activity.commit_budget,
            per_repo_cap: self.activity.per_repo_cap,
            branches_per_repo: self.activity.branches_per_repo,
            stream_scan_limit: self.activity.stream_scan_limit,
            memo_ttl: Duration::from_secs(self.activity.memo_ttl_secs),
            discovery_timeout: Duration::from_secs(self.activity.discovery_timeout_secs),
            batch_timeout: Duration::from_secs(self.activity.batch_timeout_secs),
            snapshot_path: self.snapshot.path.clone(),
            mode: if self.snapshot.prefer {
                DataMode::Snapshot
            } else {
                DataMode::Live
            },
        }
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "forgepulse").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
