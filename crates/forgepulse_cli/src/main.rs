//! Forgepulse CLI - GitHub commit and pull request activity in the terminal.

mod commands;
mod config;
mod progress;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::Term;
use forgepulse::{DataMode, OrgScope, PulseOptions};
use tracing_subscriber::EnvFilter;

use crate::commands::shared::OutputFormat;

#[derive(Parser)]
#[command(name = "forgepulse")]
#[command(version)]
#[command(about = "Commit and pull request activity across your GitHub repositories")]
#[command(
    long_about = "Forgepulse discovers every repository your token can see, narrows them to \
the recently pushed ones, and fetches their commits and pull requests in batched GraphQL \
queries. The last live result is kept in a JSON snapshot that can stand in for the API."
)]
#[command(after_long_help = r#"EXAMPLES
    Show this week's activity across every organization:
        $ forgepulse dashboard

    Only look at two organizations, refreshing every minute:
        $ forgepulse dashboard --orgs acme,initech --watch 60

    Latest commits across the branches of recently pushed repositories:
        $ forgepulse stream

    Repositories pushed in the last 30 days, as JSON:
        $ forgepulse repos --days 30 --output json

CONFIGURATION
    Forgepulse reads configuration from:
      1. ~/.config/forgepulse/config.toml (or $XDG_CONFIG_HOME/forgepulse/config.toml)
      2. ./forgepulse.toml
      3. Environment variables (FORGEPULSE_ prefix, sections split by "__")
      4. .env file in current directory

ENVIRONMENT VARIABLES
    GITHUB_TOKEN                         GitHub personal access token
    TARGET_ORGANIZATIONS                 "all" or a comma-separated list of organizations
    FORGEPULSE_GITHUB__TOKEN             Same as GITHUB_TOKEN, takes precedence
    FORGEPULSE_ACTIVITY__WINDOW_DAYS     Activity window in days (default: 7)
    FORGEPULSE_SNAPSHOT__PATH            Snapshot file (default: github_data.json)
    RUST_LOG                             Log filter (default: forgepulse=info,forgepulse_cli=info)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// This week's commits, pull requests and most active authors
    #[command(alias = "fetch")]
    Dashboard {
        #[command(flatten)]
        fetch: FetchOptions,

        /// Number of authors in the leaderboard
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Refresh every N seconds until interrupted
        #[arg(short, long, value_name = "SECS")]
        watch: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Latest commits across the branches of recently pushed repositories
    Stream {
        #[command(flatten)]
        fetch: FetchOptions,

        /// Scan the most recently pushed repositories instead of running full discovery
        #[arg(long)]
        standalone: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Repositories visible to the token, newest push first
    Repos {
        #[command(flatten)]
        fetch: FetchOptions,

        /// Include repositories outside the activity window
        #[arg(short = 'A', long)]
        all: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Profile of the authenticated user
    Whoami {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Upper bound accepted by `--days`, one century.
const MAX_WINDOW_DAYS: i64 = 36_500;

/// Options shared by every command that fetches activity.
#[derive(Debug, Clone, Default, clap::Args)]
struct FetchOptions {
    /// Organizations to include: "all" or a comma-separated list (default from config or all)
    #[arg(long, value_name = "LIST")]
    orgs: Option<String>,

    /// Only include repos pushed within this many days (default from config or 7)
    #[arg(short = 'd', long, value_parser = clap::value_parser!(i64).range(1..=MAX_WINDOW_DAYS))]
    days: Option<i64>,

    /// Read the snapshot file first and only go live when it is empty
    #[arg(short = 's', long)]
    snapshot: bool,

    /// Snapshot file (default from config or github_data.json)
    #[arg(long, value_name = "PATH")]
    snapshot_path: Option<PathBuf>,

    /// Stop paging a connection after this many pages (default from config or 50)
    #[arg(long)]
    max_pages: Option<u32>,
}

impl FetchOptions {
    /// Layer these flags over the configured options.
    fn apply(self, mut options: PulseOptions) -> PulseOptions {
        if let Some(orgs) = self.orgs {
            options.org_scope = OrgScope::parse_list(&orgs);
        }
        if let Some(days) = self.days {
            options.window_days = days;
        }
        if self.snapshot {
            options.mode = DataMode::Snapshot;
        }
        if let Some(path) = self.snapshot_path {
            options.snapshot_path = path;
        }
        if let Some(pages) = self.max_pages {
            options.max_pages = pages;
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Spinners own stderr on a TTY; otherwise log structured records.
    if !Term::stderr().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("forgepulse=info,forgepulse_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = config::Config::load();
    let cli = Cli::parse();

    match cli.command {
        Commands::Dashboard {
            fetch,
            top,
            watch,
            output,
        } => {
            let options = fetch.apply(config.pulse_options());
            commands::activity::handle_dashboard(
                &config,
                options,
                output,
                top,
                watch.map(Duration::from_secs),
            )
            .await?;
        }
        Commands::Stream {
            fetch,
            standalone,
            output,
        } => {
            let options = fetch.apply(config.pulse_options());
            commands::activity::handle_stream(&config, options, output, standalone).await?;
        }
        Commands::Repos { fetch, all, output } => {
            let options = fetch.apply(config.pulse_options());
            commands::repos::handle_repos(&config, options, output, all).await?;
        }
        Commands::Whoami { output } => {
            commands::whoami::handle_whoami(&config, &config.pulse_options(), output).await?;
        }
        Commands::Completions { shell } => {
            commands::meta::handle_completions(shell)?;
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output)?;
        }
    }

    Ok(())
}
