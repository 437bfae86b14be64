//! Pipeline knobs and their defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Default trailing-activity window.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;
/// Repositories included in the dashboard batch.
pub const DEFAULT_REPO_FETCH_LIMIT: usize = 25;
/// Hard cap on repositories in one commit-stream batch.
pub const MAX_REPOS_FOR_COMMIT_STREAM: usize = 5;
/// Commit budget shared across a commit-stream batch.
pub const DEFAULT_COMMIT_BUDGET: usize = 100;
/// Per-repository ceiling within a commit-stream batch.
pub const COMMITS_PER_REPO_CAP: usize = 10;
/// Default-branch history length in the dashboard batch.
pub const DEFAULT_COMMITS_PER_REPO: usize = 100;
pub const DEFAULT_PR_LIMIT: usize = 20;
pub const DEFAULT_BRANCHES_PER_REPO: usize = 10;
/// Repositories scanned by the standalone commit-stream lookup.
pub const DEFAULT_STREAM_SCAN_LIMIT: usize = 30;
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);
pub const BATCH_TIMEOUT: Duration = Duration::from_secs(45);
/// Page ceiling per paginated connection.
pub const DEFAULT_MAX_PAGES: u32 = 50;
/// Nodes requested per page.
pub const PAGE_SIZE: usize = 100;
pub const DEFAULT_SNAPSHOT_FILE: &str = "github_data.json";
pub const DEFAULT_MEMO_TTL: Duration = Duration::from_secs(300);

/// Which organizations contribute repositories to discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum OrgScope {
    /// Every organization the credential belongs to.
    #[default]
    All,
    /// Exactly these logins. Empty means no organization repositories.
    Explicit(Vec<String>),
}

impl OrgScope {
    /// Parse a comma-separated list; `all` selects [`OrgScope::All`].
    pub fn parse_list(input: &str) -> Self {
        if input.trim().eq_ignore_ascii_case("all") {
            return OrgScope::All;
        }
        OrgScope::Explicit(
            input
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }
}

/// Where a cycle's data comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataMode {
    /// Always fetch from the API.
    #[default]
    Live,
    /// Prefer the snapshot file, falling back to a live fetch when it is empty.
    Snapshot,
}

/// Options for one aggregation cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseOptions {
    pub org_scope: OrgScope,
    pub window_days: i64,
    pub repo_fetch_limit: usize,
    pub max_batch_repos: usize,
    pub commit_budget: usize,
    pub per_repo_cap: usize,
    pub commits_per_repo: usize,
    pub pr_limit: usize,
    pub branches_per_repo: usize,
    pub stream_scan_limit: usize,
    pub discovery_timeout: Duration,
    pub batch_timeout: Duration,
    pub max_pages: u32,
    pub snapshot_path: PathBuf,
    pub mode: DataMode,
    pub memo_ttl: Duration,
}

impl Default for PulseOptions {
    fn default() -> Self {
        Self {
            org_scope: OrgScope::All,
            window_days: DEFAULT_WINDOW_DAYS,
            repo_fetch_limit: DEFAULT_REPO_FETCH_LIMIT,
            max_batch_repos: MAX_REPOS_FOR_COMMIT_STREAM,
            commit_budget: DEFAULT_COMMIT_BUDGET,
            per_repo_cap: COMMITS_PER_REPO_CAP,
            commits_per_repo: DEFAULT_COMMITS_PER_REPO,
            pr_limit: DEFAULT_PR_LIMIT,
            branches_per_repo: DEFAULT_BRANCHES_PER_REPO,
            stream_scan_limit: DEFAULT_STREAM_SCAN_LIMIT,
            discovery_timeout: DISCOVERY_TIMEOUT,
            batch_timeout: BATCH_TIMEOUT,
            max_pages: DEFAULT_MAX_PAGES,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            mode: DataMode::Live,
            memo_ttl: DEFAULT_MEMO_TTL,
        }
    }
}
