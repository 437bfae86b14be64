
use chrono::Utc;
use console::style;
use forgepulse::activity::filter_and_report;
use forgepulse::{PulseOptions, RepositoryRef, discover};
use serde::Serialize;
use tabled::Tabled;

use crate::commands::shared::{OutputFormat, github_executor, print_json, print_table, when};
use crate::config::Config;
use crate::progress::ProgressReporter;

#[derive(Debug, Tabled)]
struct RepositoryRow {
    #[tabled(rename = "Repository")]
    name: String,
    #[tabled(rename = "Last push")]
    pushed: String,
}

impl From<&RepositoryRef> for RepositoryRow {
    fn from(repo: &RepositoryRef) -> Self {
        Self {
            name: repo.full_name.clone(),
            pushed: repo.last_pushed_at.map(when).unwrap_or_else(|| "never".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ReposJson<'a> {
    complete: bool,
    organizations: &'a [String],
    repositories: Vec<&'a RepositoryRef>,
}

/// Handle the repos command: discovery, then the activity filter unless
/// `include_inactive` is set.
pub(crate) async fn handle_repos(
    config: &Config,
    options: PulseOptions,
    output: OutputFormat,
    include_inactive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let executor = github_executor(config)?;
    let reporter = ProgressReporter::shared_for(output);
    let callback = reporter.as_callback();

    let outcome = discover(&executor, &options.org_scope, &options, Some(&callback)).await;
    let repositories: Vec<&RepositoryRef> = if include_inactive {
        outcome.repositories.iter().collect()
    } else {
        let active = filter_and_report(
            &outcome.repositories,
            options.window_days,
            Utc::now(),
            Some(&callback),
        );
        outcome
            .repositories
            .iter()
            .filter(|r| active.contains(&r.full_name))
            .collect()
    };
    reporter.finish();

    match output {
        OutputFormat::Json => print_json(&ReposJson {
            complete: outcome.complete,
            organizations: &outcome.organizations,
            repositories,
        })?,
        OutputFormat::Table => {
            let heading = if include_inactive {
                "Repositories".to_string()
            } else {
                format!("Repositories pushed in the last {} days", options.window_days)
            };
            print_table(
                &heading,
                repositories.into_iter().map(RepositoryRow::from).collect(),
                "No repositories found",
            );
            if !outcome.complete {
                println!(
                    "{} discovery stopped early, the list may be incomplete",
                    style("warning:").yellow().bold()
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use forgepulse::timeline::parse_timestamp;

    use super::*;

    #[test]
    fn test_row_for_never_pushed_repository() {
        let row = RepositoryRow::from(&RepositoryRef::new("acme/empty", None));
        assert_eq!(row.name, "acme/empty");
        assert_eq!(row.pushed, "never");
    }

    #[test]
    fn test_row_shows_push_date() {
        let row = RepositoryRow::from(&RepositoryRef::new(
            "acme/core",
            parse_timestamp("2021-06-15T12:00:00Z"),
        ));
        assert!(row.pushed.contains("2021-06-1"));
    }
}
