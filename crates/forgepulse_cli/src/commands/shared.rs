use chrono::{DateTime, Utc};
use clap::ValueEnum;
use console::{StyledObject, style};
use forgepulse::timeline::{Recency, format_local, recency, truncate_text};
use forgepulse::{CommitRecord, HttpGraphQlExecutor, PullRequestRecord, repo_display_name};
use serde::Serialize;
use tabled::Tabled;

use crate::config::Config;

/// Longest commit message or PR title shown in a table cell.
const MAX_TITLE_CHARS: usize = 60;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Build a GitHub executor from the configured token.
pub(crate) fn github_executor(
    config: &Config,
) -> Result<HttpGraphQlExecutor, Box<dyn std::error::Error>> {
    let token = config.github_token().ok_or(
        "No GitHub token configured. Set GITHUB_TOKEN, FORGEPULSE_GITHUB__TOKEN, \
         or [github] token in config.toml",
    )?;
    Ok(HttpGraphQlExecutor::github(token)?)
}

/// Color a cell by how recent `ts` is.
pub(crate) fn paint(ts: DateTime<Utc>, text: String) -> StyledObject<String> {
    match recency(ts) {
        Recency::Today => style(text).magenta().bold(),
        Recency::Yesterday => style(text).green(),
        Recency::ThisWeek => style(text).yellow(),
        Recency::Older => style(text),
    }
}

/// `🌟 2025-03-01 10:00 AM`
pub(crate) fn when(ts: DateTime<Utc>) -> String {
    let badge = recency(ts).badge();
    paint(ts, format!("{badge} {}", format_local(ts))).to_string()
}

#[derive(Debug, Tabled)]
pub(crate) struct CommitRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Repository")]
    repo: String,
    #[tabled(rename = "Branch")]
    branch: String,
    #[tabled(rename = "SHA")]
    sha: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&CommitRecord> for CommitRow {
    fn from(commit: &CommitRecord) -> Self {
        Self {
            when: when(commit.committed_at),
            repo: repo_display_name(&commit.repo).to_string(),
            branch: commit.branch_name.clone(),
            sha: commit.sha.clone(),
            author: commit.author_name.clone(),
            message: truncate_text(&commit.message_headline, MAX_TITLE_CHARS, "..."),
        }
    }
}

#[derive(Debug, Tabled)]
pub(crate) struct PullRequestRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Repository")]
    repo: String,
    #[tabled(rename = "#")]
    number: u64,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Title")]
    title: String,
}

impl From<&PullRequestRecord> for PullRequestRow {
    fn from(pr: &PullRequestRecord) -> Self {
        Self {
            when: when(pr.timestamp),
            status: pr.status.to_string(),
            repo: repo_display_name(&pr.repo).to_string(),
            number: pr.pr_number,
            author: pr.author_login.clone(),
            title: truncate_text(&pr.title, MAX_TITLE_CHARS, "..."),
        }
    }
}

/// Print `rows` as a rounded table, or `empty` when there are none.
pub(crate) fn print_table<R: Tabled>(heading: &str, rows: Vec<R>, empty: &str) {
    println!("{}", style(heading).bold().underlined());
    if rows.is_empty() {
        println!("{}\n", style(empty).dim());
        return;
    }
    let mut table = tabled::Table::new(rows);
    table.with(tabled::settings::Style::rounded());
    println!("{table}\n");
}

/// Pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use forgepulse::PrStatus;
    use forgepulse::timeline::parse_timestamp;

    use super::*;

    #[test]
    fn test_commit_row_uses_short_repo_and_truncates() {
        let commit = CommitRecord {
            repo: "acme/core".to_string(),
            repo_url: "https://github.com/acme/core".to_string(),
            branch_name: "main".to_string(),
            branch_url: "https://github.com/acme/core/tree/main".to_string(),
            sha: "abcdef1".to_string(),
            message_headline: "x".repeat(80),
            author_name: "Ada".to_string(),
            committed_at: parse_timestamp("2020-01-01T00:00:00Z").unwrap(),
            url: String::new(),
        };
        let row = CommitRow::from(&commit);
        assert_eq!(row.repo, "core");
        assert_eq!(row.message.chars().count(), MAX_TITLE_CHARS);
        assert!(row.message.ends_with("..."));
        assert!(row.when.contains("2020-01-0") || row.when.contains("2019-12-31"));
    }

    #[test]
    fn test_pull_request_row_shows_status() {
        let pr = PullRequestRecord {
            repo: "acme/core".to_string(),
            repo_url: String::new(),
            pr_number: 42,
            title: "Add CI".to_string(),
            author_login: "bob".to_string(),
            status: PrStatus::Merged,
            timestamp: parse_timestamp("2020-01-01T00:00:00Z").unwrap(),
            url: String::new(),
        };
        let row = PullRequestRow::from(&pr);
        assert_eq!(row.number, 42);
        assert_eq!(row.status, PrStatus::Merged.to_string());
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let config = Config::default();
        if config.github_token().is_none() {
            assert!(github_executor(&config).is_err());
        }
    }
}
