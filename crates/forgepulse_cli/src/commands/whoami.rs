use console::style;
use forgepulse::viewer::fetch_viewer_profile;
use forgepulse::{PulseOptions, ViewerProfile};
use tabled::Tabled;

use crate::commands::shared::{OutputFormat, github_executor, print_json};
use crate::config::Config;
use crate::progress::LoggingReporter;

#[derive(Debug, Tabled)]
struct ProfileRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn profile_rows(profile: &ViewerProfile) -> Vec<ProfileRow> {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    vec![
        ProfileRow {
            field: "Login",
            value: profile.login.clone(),
        },
        ProfileRow {
            field: "Name",
            value: profile.display_name().to_string(),
        },
        ProfileRow {
            field: "Company",
            value: text(&profile.company),
        },
        ProfileRow {
            field: "Location",
            value: text(&profile.location),
        },
        ProfileRow {
            field: "Repositories",
            value: profile.repositories.to_string(),
        },
        ProfileRow {
            field: "Followers",
            value: profile.followers.to_string(),
        },
        ProfileRow {
            field: "Following",
            value: profile.following.to_string(),
        },
        ProfileRow {
            field: "Commits this year",
            value: profile.commit_contributions.to_string(),
        },
        ProfileRow {
            field: "Pull requests this year",
            value: profile.pull_request_contributions.to_string(),
        },
    ]
}

/// Handle the whoami command.
pub(crate) async fn handle_whoami(
    config: &Config,
    options: &PulseOptions,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let executor = github_executor(config)?;
    let reporter = LoggingReporter::new();
    let callback: forgepulse::ProgressCallback = Box::new(move |event| reporter.handle(event));

    let profile = fetch_viewer_profile(&executor, options, Some(&callback))
        .await
        .ok_or("Could not fetch the viewer profile")?;

    match output {
        OutputFormat::Json => print_json(&profile)?,
        OutputFormat::Table => {
            println!("{}", style(profile.display_name()).bold().cyan());
            let mut table = tabled::Table::new(profile_rows(&profile));
            table.with(tabled::settings::Style::rounded());
            println!("{table}");
        }
    }
    Ok(())
}
