use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use console::{Term, style};
use forgepulse::source::{commit_stream_from_repositories, commit_stream_standalone};
use forgepulse::timeline::{AuthorCount, WeeklyDigest, author_activity};
use forgepulse::{
    ActivityReport, ActivitySource, CommitRecord, DataMode, LiveSource, MemoCache, MemoKey,
    PulseOptions, RepositoryRef, SnapshotSource, discover, load_activity,
};
use serde::Serialize;
use tabled::Tabled;

use crate::commands::shared::{
    CommitRow, OutputFormat, PullRequestRow, github_executor, print_json, print_table,
};
use crate::config::Config;
use crate::progress::ProgressReporter;

#[derive(Debug, Tabled)]
struct AuthorRow {
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Commits")]
    count: usize,
}

impl From<AuthorCount> for AuthorRow {
    fn from(count: AuthorCount) -> Self {
        Self {
            author: count.author,
            count: count.count,
        }
    }
}

/// JSON shape of one dashboard cycle.
#[derive(Debug, Serialize)]
struct DashboardJson<'a> {
    origin: &'static str,
    discovery_complete: bool,
    repositories: &'a [RepositoryRef],
    data: &'a forgepulse::ActivityData,
    this_week: &'a WeeklyDigest,
    top_authors: Vec<AuthorCount>,
}

/// One cycle: memoized live data, or the snapshot when preferred or when no
/// token is configured.
async fn load_cycle(
    config: &Config,
    options: &PulseOptions,
    memo: &MemoCache<ActivityReport>,
    reporter: &Arc<ProgressReporter>,
) -> Result<ActivityReport, Box<dyn std::error::Error>> {
    let callback = reporter.as_callback();
    let snapshot = SnapshotSource::new(&options.snapshot_path);

    let report = match github_executor(config) {
        Ok(executor) => {
            let key = MemoKey::for_cycle(config.github_token().unwrap_or_default(), options);
            let live = LiveSource::new(&executor, options).with_memo(memo, key);
            load_activity(&live, &snapshot, options.mode, Some(&callback)).await
        }
        Err(e) if options.mode == DataMode::Snapshot => {
            tracing::debug!(error = %e, "No credential, reading snapshot only");
            snapshot.load(Some(&callback)).await.ok_or(e)?
        }
        Err(e) => return Err(e),
    };
    reporter.finish();
    Ok(report)
}

fn render_dashboard(report: &ActivityReport, top: usize) {
    let digest = report.weekly_digest(Utc::now());

    println!(
        "{} {} commits and {} pull requests this week {}",
        style("forgepulse").bold().cyan(),
        style(digest.commits.len()).bold(),
        style(digest.pull_requests.len()).bold(),
        style(format!(
            "({} data, {:.1}s)",
            report.origin.as_str(),
            report.timings.total().as_secs_f64()
        ))
        .dim()
    );
    if !report.discovery_complete {
        println!(
            "{} repository discovery was incomplete, some activity may be missing",
            style("warning:").yellow().bold()
        );
    }
    println!();

    print_table(
        "Commits this week",
        digest.commits.iter().map(CommitRow::from).collect(),
        "No commits in the last 7 days",
    );
    print_table(
        "Pull requests this week",
        digest.pull_requests.iter().map(PullRequestRow::from).collect(),
        "No pull requests in the last 7 days",
    );
    print_table(
        "Most active authors",
        author_activity(&report.data.commits, top)
            .into_iter()
            .map(AuthorRow::from)
            .collect(),
        "No commits fetched",
    );
}

/// Handle the dashboard command, optionally refreshing every `watch`.
pub(crate) async fn handle_dashboard(
    config: &Config,
    options: PulseOptions,
    output: OutputFormat,
    top: usize,
    watch: Option<Duration>,
) -> Result<(), Box<dyn std::error::Error>> {
    let memo = MemoCache::new(options.memo_ttl);
    let reporter = ProgressReporter::shared_for(output);

    loop {
        let report = load_cycle(config, &options, &memo, &reporter).await?;

        match output {
            OutputFormat::Json => {
                let digest = report.weekly_digest(Utc::now());
                print_json(&DashboardJson {
                    origin: report.origin.as_str(),
                    discovery_complete: report.discovery_complete,
                    repositories: &report.repositories,
                    data: &report.data,
                    this_week: &digest,
                    top_authors: author_activity(&report.data.commits, top),
                })?;
            }
            OutputFormat::Table => {
                if watch.is_some() {
                    Term::stdout().clear_screen().ok();
                }
                render_dashboard(&report, top);
            }
        }

        let Some(interval) = watch else {
            break;
        };
        tokio::time::sleep(interval).await;
    }

    Ok(())
}

/// Handle the commit stream command.
pub(crate) async fn handle_stream(
    config: &Config,
    options: PulseOptions,
    output: OutputFormat,
    standalone: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let executor = github_executor(config)?;
    let reporter = ProgressReporter::shared_for(output);
    let callback = reporter.as_callback();
    let now = Utc::now();

    let commits: Vec<CommitRecord> = if standalone {
        commit_stream_standalone(&executor, &options, now, Some(&callback)).await
    } else {
        let outcome = discover(&executor, &options.org_scope, &options, Some(&callback)).await;
        commit_stream_from_repositories(
            &executor,
            &outcome.repositories,
            &options,
            now,
            Some(&callback),
        )
        .await
    };
    reporter.finish();

    match output {
        OutputFormat::Json => print_json(&commits)?,
        OutputFormat::Table => print_table(
            "Recent commits across branches",
            commits.iter().map(CommitRow::from).collect(),
            "No recent commits",
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_row_from_count() {
        let row = AuthorRow::from(AuthorCount {
            author: "Ada".to_string(),
            count: 3,
        });
        assert_eq!(row.author, "Ada");
        assert_eq!(row.count, 3);
    }

    #[test]
    fn test_json_output_is_silent() {
        assert!(matches!(
            *ProgressReporter::shared_for(OutputFormat::Json),
            ProgressReporter::Silent
        ));
    }
}
