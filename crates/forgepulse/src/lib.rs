//! Forgepulse - commit and pull request activity across GitHub repositories.
//!
//! This library discovers every repository a token can see, narrows them to
//! the recently active ones, fetches their commits and pull requests in
//! batched GraphQL queries, and flattens the result into time-ordered records.
//! A JSON snapshot of the last live result doubles as an offline fallback.
//!
//! # Example
//!
//! ```ignore
//! use forgepulse::{
//!     DataMode, HttpGraphQlExecutor, LiveSource, PulseOptions, SnapshotSource, load_activity,
//! };
//!
//! let executor = HttpGraphQlExecutor::github(&token)?;
//! let options = PulseOptions::default();
//! let live = LiveSource::new(&executor, &options);
//! let snapshot = SnapshotSource::new(&options.snapshot_path);
//!
//! let report = load_activity(&live, &snapshot, DataMode::Live, None).await;
//! for commit in &report.data.commits {
//!     println!("{} {} {}", commit.sha, commit.repo, commit.message_headline);
//! }
//! ```

pub mod activity;
pub mod batch;
pub mod discovery;
pub mod fields;
pub mod graphql;
pub mod http;
pub mod memo;
pub mod model;
pub mod options;
pub mod parse;
pub mod progress;
pub mod query;
pub mod snapshot;
pub mod source;
pub mod timeline;
pub mod viewer;

pub use discovery::{DiscoveryOutcome, discover};
pub use graphql::{
    FailureKind, GraphQlExecutor, GraphQlRequest, HttpGraphQlExecutor, QueryError, fetch_data,
};
pub use memo::{MemoCache, MemoKey};
pub use model::{
    ActivityData, CommitRecord, OrganizationRef, PrStatus, PullRequestRecord, RepositoryRef,
    Snapshot, ViewerProfile, repo_display_name,
};
pub use options::{DataMode, OrgScope, PulseOptions};
pub use progress::{ProgressCallback, PulseProgress};
pub use source::{
    ActivityReport, ActivitySource, DataOrigin, FetchTimings, LiveSource, SnapshotSource,
    load_activity,
};
pub use timeline::{Recency, classify, is_today};
