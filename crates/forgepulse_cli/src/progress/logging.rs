use forgepulse::PulseProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: PulseProgress) {
        match event {
            PulseProgress::DiscoveringRepos { namespace } => {
                tracing::info!(namespace = %namespace, "Discovering repositories");
            }

            PulseProgress::FetchedPage {
                namespace,
                page,
                count,
            } => {
                tracing::debug!(namespace = %namespace, page, count, "Fetched page");
            }

            PulseProgress::DiscoveryComplete {
                total,
                organizations,
            } => {
                tracing::info!(total, organizations, "Discovery complete");
            }

            PulseProgress::DiscoveryTruncated { namespace, pages } => {
                tracing::warn!(namespace = %namespace, pages, "Discovery stopped at page ceiling");
            }

            PulseProgress::OrganizationSkipped { login } => {
                tracing::warn!(org = %login, "Organization skipped");
            }

            PulseProgress::FilterComplete {
                matched,
                total,
                days,
            } => {
                tracing::info!(matched, total, days, "Filtered by activity");
            }

            PulseProgress::BatchQueryStarted {
                repositories,
                commits_per_repo,
            } => {
                tracing::info!(repositories, commits_per_repo, "Fetching repository activity");
            }

            PulseProgress::BatchQueryComplete {
                commits,
                open_prs,
                merged_prs,
                elapsed_ms,
            } => {
                tracing::info!(commits, open_prs, merged_prs, elapsed_ms, "Activity fetched");
            }

            PulseProgress::SnapshotLoaded {
                path,
                commits,
                pull_requests,
            } => {
                tracing::info!(path = %path, commits, pull_requests, "Using snapshot data");
            }

            PulseProgress::SnapshotSaved { path } => {
                tracing::info!(path = %path, "Snapshot saved");
            }

            PulseProgress::MemoHit { age_secs } => {
                tracing::info!(age_secs, "Served from memory");
            }

            PulseProgress::Warning { message } => {
                tracing::warn!(message = %message, "Warning");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
