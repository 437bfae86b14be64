use std::sync::Mutex;
use std::time::Duration;

use console::style;
use forgepulse::PulseProgress;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Bars for the two network phases.
#[derive(Default)]
struct ProgressState {
    discovery_bar: Option<ProgressBar>,
    /// Repositories seen across fetched pages.
    discovered: usize,
    batch_bar: Option<ProgressBar>,
}

/// Interactive progress reporter using indicatif.
///
/// One spinner follows discovery page by page, a second one covers the
/// batched activity query. Warnings print above the bars.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    fn spinner(&self, prefix: &str) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(Self::spinner_style());
        bar.set_prefix(format!("{prefix:10}"));
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    fn println(&self, line: String) {
        self.multi.println(line).ok();
    }

    pub fn handle(&self, event: PulseProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            PulseProgress::DiscoveringRepos { namespace } => {
                let bar = state
                    .discovery_bar
                    .get_or_insert_with(|| self.spinner("discover"));
                bar.set_message(format!("Listing {namespace}..."));
            }

            PulseProgress::FetchedPage {
                namespace,
                page,
                count,
            } => {
                state.discovered += count;
                let discovered = state.discovered;
                if let Some(bar) = &state.discovery_bar {
                    bar.set_message(format!(
                        "{namespace} page {page} ({discovered} repos so far)"
                    ));
                }
            }

            PulseProgress::DiscoveryComplete {
                total,
                organizations,
            } => {
                if let Some(bar) = state.discovery_bar.take() {
                    bar.finish_with_message(format!(
                        "{} {total} repositories across {organizations} organizations",
                        style("✓").green()
                    ));
                }
            }

            PulseProgress::DiscoveryTruncated { namespace, pages } => {
                self.println(format!(
                    "{} {namespace}: stopped after {pages} pages, results may be incomplete",
                    style("!").yellow().bold()
                ));
            }

            PulseProgress::OrganizationSkipped { login } => {
                self.println(format!(
                    "{} {login}: organization not accessible, skipped",
                    style("!").yellow().bold()
                ));
            }

            PulseProgress::FilterComplete {
                matched,
                total,
                days,
            } => {
                self.println(format!(
                    "{} {matched} of {total} repositories active in the last {days} days",
                    style("✓").green()
                ));
            }

            PulseProgress::BatchQueryStarted {
                repositories,
                commits_per_repo,
            } => {
                let bar = self.spinner("activity");
                bar.set_message(format!(
                    "Querying {repositories} repositories ({commits_per_repo} commits each)..."
                ));
                state.batch_bar = Some(bar);
            }

            PulseProgress::BatchQueryComplete {
                commits,
                open_prs,
                merged_prs,
                elapsed_ms,
            } => {
                if let Some(bar) = state.batch_bar.take() {
                    bar.finish_with_message(format!(
                        "{} {commits} commits, {open_prs} open and {merged_prs} merged PRs in {:.1}s",
                        style("✓").green(),
                        elapsed_ms as f64 / 1000.0
                    ));
                }
            }

            PulseProgress::SnapshotLoaded {
                path,
                commits,
                pull_requests,
            } => {
                self.println(format!(
                    "{} Using snapshot {path} ({commits} commits, {pull_requests} PRs)",
                    style("•").cyan()
                ));
            }

            PulseProgress::SnapshotSaved { path } => {
                self.println(format!("{} Snapshot saved to {path}", style("•").cyan()));
            }

            PulseProgress::MemoHit { age_secs } => {
                self.println(format!(
                    "{} Served from memory ({age_secs}s old)",
                    style("•").cyan()
                ));
            }

            PulseProgress::Warning { message } => {
                self.println(format!("{} {message}", style("warning:").yellow().bold()));
            }

            _ => {}
        }
    }

    /// Clear any bar still running, e.g. after a failed phase.
    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for bar in [state.discovery_bar.take(), state.batch_bar.take()]
            .into_iter()
            .flatten()
        {
            bar.finish_and_clear();
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
