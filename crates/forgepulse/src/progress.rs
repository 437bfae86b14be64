//! Progress reporting for aggregation cycles.
//!
//! Every phase of a cycle reports through an optional [`ProgressCallback`], so
//! a front end can render progress or surface warnings without the library
//! depending on any UI.

/// Progress events emitted during an aggregation cycle.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PulseProgress {
    /// Starting to page through a repository connection.
    DiscoveringRepos {
        /// `"viewer"` for direct affiliation, otherwise the organization login.
        namespace: String,
    },

    /// Fetched one page of a connection.
    FetchedPage {
        /// The namespace this page belongs to.
        namespace: String,
        /// Page number (1-indexed).
        page: u32,
        /// Number of nodes on this page.
        count: usize,
    },

    /// Discovery finished across all namespaces.
    DiscoveryComplete {
        /// Distinct repositories found.
        total: usize,
        /// Number of organizations visited.
        organizations: usize,
    },

    /// A connection hit the page ceiling before the server reported its end.
    DiscoveryTruncated {
        namespace: String,
        pages: u32,
    },

    /// An organization contributed nothing (no access, not found, or failure).
    OrganizationSkipped { login: String },

    /// Activity filter complete.
    FilterComplete {
        /// Repositories that matched the window.
        matched: usize,
        /// Repositories considered.
        total: usize,
        /// Window in days.
        days: i64,
    },

    /// Sending a batched repository query.
    BatchQueryStarted {
        /// Repositories referenced by the document.
        repositories: usize,
        /// Commits requested per history connection.
        commits_per_repo: usize,
    },

    /// Batched query parsed.
    BatchQueryComplete {
        commits: usize,
        open_prs: usize,
        merged_prs: usize,
        elapsed_ms: u64,
    },

    /// Snapshot data used instead of a live fetch.
    SnapshotLoaded {
        path: String,
        commits: usize,
        pull_requests: usize,
    },

    /// Snapshot written after a live fetch.
    SnapshotSaved { path: String },

    /// A memoized result was served without touching the network.
    MemoHit { age_secs: u64 },

    /// A contained failure the user should see.
    Warning { message: String },
}

/// Callback for progress updates.
pub type ProgressCallback = Box<dyn Fn(PulseProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: PulseProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
