//! Flatten batched repository responses into records.
//!
//! A batch response maps aliases (`repo0`, `repo1`, ...) to repository
//! sub-trees. Any sub-tree may be null and any nested connection may be
//! missing; those contribute nothing and never fail the batch.

use serde_json::Value;

use crate::fields::{TextField, lookup, required_str, text_or_default};
use crate::model::{ActivityData, CommitRecord, PrStatus, PullRequestRecord};
use crate::timeline::{parse_timestamp, sort_newest_first};

/// Length of an abbreviated object id.
pub const SHORT_SHA_LEN: usize = 7;

/// Alias for the repository at position `index` in a batch.
pub fn alias_for(index: usize) -> String {
    format!("repo{index}")
}

fn alias_index(alias: &str) -> usize {
    alias
        .strip_prefix("repo")
        .and_then(|n| n.parse().ok())
        .unwrap_or(usize::MAX)
}

/// Flatten every aliased repository in `data`, each collection newest first.
pub fn parse_batch(data: &Value) -> ActivityData {
    let mut out = ActivityData::default();
    let Some(aliases) = data.as_object() else {
        return out;
    };

    let mut entries: Vec<(&String, &Value)> = aliases.iter().collect();
    entries.sort_by_key(|(alias, _)| alias_index(alias));

    for (alias, repo) in entries {
        if repo.is_null() {
            tracing::debug!(alias = %alias, "No data for repository (access denied or not found)");
            continue;
        }
        parse_repository(alias, repo, &mut out);
    }

    sort_newest_first(&mut out.commits);
    sort_newest_first(&mut out.open_prs);
    sort_newest_first(&mut out.merged_prs);
    out
}

fn parse_repository(alias: &str, repo: &Value, out: &mut ActivityData) {
    let Some(repo_name) = required_str(repo, &["nameWithOwner"]) else {
        tracing::warn!(alias = %alias, "Repository result without nameWithOwner");
        return;
    };
    let repo_url = text_or_default(repo, TextField::Url);
    let context = RepoContext {
        name: repo_name,
        url: &repo_url,
    };

    if let Some(default_ref) = lookup(repo, &["defaultBranchRef"]) {
        context.push_branch_commits(default_ref, &mut out.commits);
    }

    if let Some(refs) = lookup(repo, &["refs", "nodes"]).and_then(Value::as_array) {
        tracing::debug!(repo = %repo_name, branches = refs.len(), "Parsing branch refs");
        for branch in refs {
            context.push_branch_commits(branch, &mut out.commits);
        }
    }

    context.push_pull_requests(repo, "openPRs", PrStatus::Open, &mut out.open_prs);
    context.push_pull_requests(repo, "mergedPRs", PrStatus::Merged, &mut out.merged_prs);
}

struct RepoContext<'a> {
    name: &'a str,
    url: &'a str,
}

impl RepoContext<'_> {
    fn push_branch_commits(&self, branch: &Value, commits: &mut Vec<CommitRecord>) {
        let branch_name = text_or_default(branch, TextField::BranchName);
        let Some(history) =
            lookup(branch, &["target", "history", "nodes"]).and_then(Value::as_array)
        else {
            tracing::debug!(
                repo = %self.name,
                branch = %branch_name,
                "No commit history available"
            );
            return;
        };

        let branch_url = format!("{}/tree/{}", self.url, branch_name);
        commits.extend(
            history
                .iter()
                .filter_map(|node| self.commit(node, &branch_name, &branch_url)),
        );
    }

    fn commit(&self, node: &Value, branch_name: &str, branch_url: &str) -> Option<CommitRecord> {
        let oid = required_str(node, &["oid"]).unwrap_or_default();
        let Some(sha) = oid.get(..SHORT_SHA_LEN).filter(|_| oid.is_ascii()) else {
            tracing::warn!(repo = %self.name, oid = %oid, "Skipping commit with malformed oid");
            return None;
        };
        let raw_date = required_str(node, &["committedDate"]).unwrap_or_default();
        let Some(committed_at) = parse_timestamp(raw_date) else {
            tracing::warn!(
                repo = %self.name,
                sha = %sha,
                date = %raw_date,
                "Skipping commit with unparseable date"
            );
            return None;
        };

        Some(CommitRecord {
            repo: self.name.to_string(),
            repo_url: self.url.to_string(),
            branch_name: branch_name.to_string(),
            branch_url: branch_url.to_string(),
            sha: sha.to_string(),
            message_headline: text_or_default(node, TextField::CommitMessage),
            author_name: text_or_default(node, TextField::CommitAuthor),
            committed_at,
            url: text_or_default(node, TextField::Url),
        })
    }

    fn push_pull_requests(
        &self,
        repo: &Value,
        connection: &str,
        status: PrStatus,
        prs: &mut Vec<PullRequestRecord>,
    ) {
        let Some(nodes) = lookup(repo, &[connection, "nodes"]).and_then(Value::as_array) else {
            return;
        };
        let date_field = match status {
            PrStatus::Open => "createdAt",
            PrStatus::Merged => "mergedAt",
        };

        for node in nodes {
            let Some(number) = lookup(node, &["number"]).and_then(Value::as_u64) else {
                tracing::warn!(repo = %self.name, "Skipping pull request without a number");
                continue;
            };
            let raw_date = required_str(node, &[date_field]).unwrap_or_default();
            let Some(timestamp) = parse_timestamp(raw_date) else {
                tracing::warn!(
                    repo = %self.name,
                    pr = number,
                    date = %raw_date,
                    "Skipping pull request with unparseable date"
                );
                continue;
            };

            prs.push(PullRequestRecord {
                repo: self.name.to_string(),
                repo_url: self.url.to_string(),
                pr_number: number,
                title: text_or_default(node, TextField::PrTitle),
                author_login: text_or_default(node, TextField::PrAuthor),
                status,
                timestamp,
                url: text_or_default(node, TextField::Url),
            });
        }
    }
}
