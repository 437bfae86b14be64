//! Flat activity records and the values that describe a fetch cycle.
//!
//! Records serialize with the field names of the snapshot file (`message`,
//! `author`, `date`), so a snapshot written by any earlier cycle loads back
//! into the same types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository visible to the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    /// `owner/name`, unique within one discovery pass.
    pub full_name: String,
    /// Last push, if the repository has ever been pushed to.
    pub last_pushed_at: Option<DateTime<Utc>>,
}

impl RepositoryRef {
    pub fn new(full_name: impl Into<String>, last_pushed_at: Option<DateTime<Utc>>) -> Self {
        Self {
            full_name: full_name.into(),
            last_pushed_at,
        }
    }
}

/// One commit on one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// `owner/name` of the repository.
    pub repo: String,
    /// Repository web URL.
    pub repo_url: String,
    /// Branch the commit was reached through.
    pub branch_name: String,
    /// `{repo_url}/tree/{branch_name}`.
    pub branch_url: String,
    /// First 7 characters of the object id.
    pub sha: String,
    /// Commit headline.
    #[serde(rename = "message")]
    pub message_headline: String,
    /// Git author name, or the sentinel when absent.
    #[serde(rename = "author")]
    pub author_name: String,
    /// Commit timestamp.
    #[serde(rename = "date")]
    pub committed_at: DateTime<Utc>,
    /// Commit web URL.
    pub url: String,
}

/// Pull request state as reported by a batch query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrStatus {
    #[default]
    Open,
    Merged,
}

impl PrStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PrStatus::Open => "Open",
            PrStatus::Merged => "Merged",
        }
    }
}

impl std::fmt::Display for PrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub repo: String,
    pub repo_url: String,
    pub pr_number: u64,
    pub title: String,
    #[serde(rename = "author")]
    pub author_login: String,
    #[serde(default)]
    pub status: PrStatus,
    /// Creation time for open PRs, merge time for merged PRs.
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub url: String,
}

/// An organization login, used only while discovering repositories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrganizationRef {
    pub login: String,
}

/// The three record collections of one aggregation cycle.
///
/// This is also the persisted snapshot shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityData {
    #[serde(default)]
    pub commits: Vec<CommitRecord>,
    #[serde(default)]
    pub open_prs: Vec<PullRequestRecord>,
    #[serde(default)]
    pub merged_prs: Vec<PullRequestRecord>,
}

/// Persisted form of [`ActivityData`].
pub type Snapshot = ActivityData;

impl ActivityData {
    /// True when all three collections are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty() && self.open_prs.is_empty() && self.merged_prs.is_empty()
    }

    #[must_use]
    pub fn pull_request_count(&self) -> usize {
        self.open_prs.len() + self.merged_prs.len()
    }
}

/// Summary of the authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerProfile {
    pub login: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub repositories: u64,
    pub followers: u64,
    pub following: u64,
    /// Commit contributions in the current contribution year.
    pub commit_contributions: u64,
    /// Pull request contributions in the current contribution year.
    pub pull_request_contributions: u64,
}

impl ViewerProfile {
    /// Display name, falling back to the login.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.login)
    }
}

/// The repository part of `owner/name`.
///
/// Returns the input unchanged when it has no `/`.
pub fn repo_display_name(full_name: &str) -> &str {
    full_name.rsplit('/').next().unwrap_or(full_name)
}
