//! Interchangeable data sources and the snapshot fallback policy.
//!
//! [`LiveSource`] runs discovery and the dashboard batch against the API.
//! [`SnapshotSource`] reads the snapshot file. [`load_activity`] decides which
//! one answers a cycle and whether the live result is written back.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::activity::{discover_active, filter_and_report, filter_pairs_and_report};
use crate::batch::{fetch_commit_stream, fetch_dashboard};
use crate::discovery::discover;
use crate::graphql::GraphQlExecutor;
use crate::memo::{Clock, MemoCache, MemoKey, SystemClock};
use crate::model::{ActivityData, CommitRecord, RepositoryRef};
use crate::options::{DataMode, PulseOptions};
use crate::progress::{ProgressCallback, PulseProgress, emit};
use crate::snapshot;
use crate::timeline::{WeeklyDigest, weekly_digest};

/// Where a report's data came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataOrigin {
    #[default]
    Live,
    Snapshot,
    /// A memoized live result.
    Memo,
}

impl DataOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            DataOrigin::Live => "live",
            DataOrigin::Snapshot => "snapshot",
            DataOrigin::Memo => "memo",
        }
    }
}

/// Elapsed time of the two network phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchTimings {
    pub discovery: Duration,
    pub batch: Duration,
}

impl FetchTimings {
    pub fn total(&self) -> Duration {
        self.discovery + self.batch
    }
}

/// Result of one aggregation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityReport {
    pub data: ActivityData,
    /// Discovered repositories, newest push first. Empty for snapshot data.
    pub repositories: Vec<RepositoryRef>,
    /// False when discovery stopped at the page ceiling or on a failed page.
    pub discovery_complete: bool,
    pub origin: DataOrigin,
    pub timings: FetchTimings,
}

impl ActivityReport {
    fn from_snapshot(data: ActivityData) -> Self {
        Self {
            data,
            repositories: Vec::new(),
            discovery_complete: true,
            origin: DataOrigin::Snapshot,
            timings: FetchTimings::default(),
        }
    }

    /// Activity from the trailing week.
    pub fn weekly_digest(&self, now: DateTime<Utc>) -> WeeklyDigest {
        weekly_digest(&self.data, now)
    }
}

/// A provider of one cycle's activity.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// `None` when this source has nothing to offer.
    async fn load(&self, on_progress: Option<&ProgressCallback>) -> Option<ActivityReport>;
}

/// Discovery plus the dashboard batch, optionally memoized.
pub struct LiveSource<'a, C: Clock = SystemClock> {
    executor: &'a dyn GraphQlExecutor,
    options: &'a PulseOptions,
    memo: Option<(&'a MemoCache<ActivityReport, C>, MemoKey)>,
}

impl<'a> LiveSource<'a, SystemClock> {
    pub fn new(executor: &'a dyn GraphQlExecutor, options: &'a PulseOptions) -> Self {
        Self {
            executor,
            options,
            memo: None,
        }
    }
}

impl<'a, C: Clock> LiveSource<'a, C> {
    /// Serve repeated cycles from `memo` while its entry is fresh.
    pub fn with_memo<C2: Clock>(
        self,
        memo: &'a MemoCache<ActivityReport, C2>,
        key: MemoKey,
    ) -> LiveSource<'a, C2> {
        LiveSource {
            executor: self.executor,
            options: self.options,
            memo: Some((memo, key)),
        }
    }

    async fn fetch(&self, on_progress: Option<&ProgressCallback>) -> ActivityReport {
        let started = Instant::now();
        let outcome = discover(
            self.executor,
            &self.options.org_scope,
            self.options,
            on_progress,
        )
        .await;
        let discovery = started.elapsed();

        if outcome.repositories.is_empty() {
            tracing::info!("No repositories found");
            return ActivityReport {
                discovery_complete: outcome.complete,
                timings: FetchTimings {
                    discovery,
                    batch: Duration::ZERO,
                },
                ..Default::default()
            };
        }

        let started = Instant::now();
        let data =
            fetch_dashboard(self.executor, &outcome.names(), self.options, on_progress).await;
        let batch = started.elapsed();

        ActivityReport {
            data,
            repositories: outcome.repositories,
            discovery_complete: outcome.complete,
            origin: DataOrigin::Live,
            timings: FetchTimings { discovery, batch },
        }
    }
}

#[async_trait]
impl<C: Clock> ActivitySource for LiveSource<'_, C> {
    async fn load(&self, on_progress: Option<&ProgressCallback>) -> Option<ActivityReport> {
        if let Some((memo, key)) = &self.memo
            && let Some((mut report, age)) = memo.get(key)
        {
            tracing::debug!(age_secs = age.as_secs(), "Serving memoized activity");
            emit(
                on_progress,
                PulseProgress::MemoHit {
                    age_secs: age.as_secs(),
                },
            );
            report.origin = DataOrigin::Memo;
            return Some(report);
        }

        let report = self.fetch(on_progress).await;
        if let Some((memo, key)) = &self.memo
            && !report.data.is_empty()
        {
            memo.insert(*key, report.clone());
        }
        Some(report)
    }
}

/// Activity read from the snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ActivitySource for SnapshotSource {
    async fn load(&self, on_progress: Option<&ProgressCallback>) -> Option<ActivityReport> {
        let data = snapshot::load(&self.path);
        if data.is_empty() {
            return None;
        }
        tracing::info!(
            path = %self.path.display(),
            commits = data.commits.len(),
            pull_requests = data.pull_request_count(),
            "Using snapshot data"
        );
        emit(
            on_progress,
            PulseProgress::SnapshotLoaded {
                path: self.path.display().to_string(),
                commits: data.commits.len(),
                pull_requests: data.pull_request_count(),
            },
        );
        Some(ActivityReport::from_snapshot(data))
    }
}

/// Produce one cycle's activity under `mode`.
///
/// In [`DataMode::Snapshot`] a non-empty snapshot answers the cycle without any
/// network call. Otherwise `live` is consulted, and a non-empty live result is
/// written to the snapshot unless snapshot mode is on and the file already
/// exists.
pub async fn load_activity(
    live: &dyn ActivitySource,
    snapshot_source: &SnapshotSource,
    mode: DataMode,
    on_progress: Option<&ProgressCallback>,
) -> ActivityReport {
    if mode == DataMode::Snapshot {
        if let Some(report) = snapshot_source.load(on_progress).await {
            return report;
        }
        tracing::info!("Snapshot empty, fetching live data");
    }

    let report = live.load(on_progress).await.unwrap_or_default();

    let path = snapshot_source.path();
    let authoritative = mode == DataMode::Snapshot && path.exists();
    if report.origin == DataOrigin::Live
        && !report.data.is_empty()
        && !authoritative
        && snapshot::save(path, &report.data)
    {
        emit(
            on_progress,
            PulseProgress::SnapshotSaved {
                path: path.display().to_string(),
            },
        );
    }
    report
}

/// Commit stream over repositories the caller already discovered.
pub async fn commit_stream_from_repositories(
    executor: &dyn GraphQlExecutor,
    repos: &[RepositoryRef],
    options: &PulseOptions,
    now: DateTime<Utc>,
    on_progress: Option<&ProgressCallback>,
) -> Vec<CommitRecord> {
    let active = filter_and_report(repos, options.window_days, now, on_progress);
    if active.is_empty() {
        return Vec::new();
    }
    fetch_commit_stream(executor, &active, options, on_progress).await
}

/// Commit stream over `(name, pushed_at)` pairs from an earlier listing.
pub async fn commit_stream_from_pairs(
    executor: &dyn GraphQlExecutor,
    pairs: &[(String, Option<String>)],
    options: &PulseOptions,
    now: DateTime<Utc>,
    on_progress: Option<&ProgressCallback>,
) -> Vec<CommitRecord> {
    let active = filter_pairs_and_report(pairs, options.window_days, now, on_progress);
    if active.is_empty() {
        return Vec::new();
    }
    fetch_commit_stream(executor, &active, options, on_progress).await
}

/// Commit stream with its own repository lookup.
pub async fn commit_stream_standalone(
    executor: &dyn GraphQlExecutor,
    options: &PulseOptions,
    now: DateTime<Utc>,
    on_progress: Option<&ProgressCallback>,
) -> Vec<CommitRecord> {
    let active = discover_active(executor, options, now, on_progress).await;
    if active.is_empty() {
        return Vec::new();
    }
    fetch_commit_stream(executor, &active, options, on_progress).await
}
