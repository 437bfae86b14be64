//! Narrow a repository list to the ones pushed within a trailing window.

use chrono::{DateTime, Utc};

use crate::discovery::recently_pushed;
use crate::graphql::GraphQlExecutor;
use crate::model::RepositoryRef;
use crate::options::PulseOptions;
use crate::progress::{ProgressCallback, PulseProgress, emit};
use crate::timeline::{parse_timestamp, window_start};

/// Names of repositories pushed within `[now - window_days, now]`.
///
/// Input order is preserved. Repositories without a push date are excluded.
pub fn filter_active(repos: &[RepositoryRef], window_days: i64, now: DateTime<Utc>) -> Vec<String> {
    let cutoff = window_start(now, window_days);
    repos
        .iter()
        .filter(|repo| {
            let active = repo
                .last_pushed_at
                .is_some_and(|pushed| pushed >= cutoff && pushed <= now);
            tracing::trace!(repo = %repo.full_name, active, "Activity check");
            active
        })
        .map(|repo| repo.full_name.clone())
        .collect()
}

/// [`filter_active`] over caller-supplied `(name, pushed_at)` pairs.
///
/// Push dates that fail to parse count as missing.
pub fn filter_active_pairs(
    pairs: &[(String, Option<String>)],
    window_days: i64,
    now: DateTime<Utc>,
) -> Vec<String> {
    let repos: Vec<RepositoryRef> = pairs
        .iter()
        .map(|(name, pushed)| {
            let parsed = pushed.as_deref().and_then(|raw| {
                let ts = parse_timestamp(raw);
                if ts.is_none() {
                    tracing::warn!(repo = %name, pushed_at = %raw, "Unparseable push date");
                }
                ts
            });
            RepositoryRef::new(name.clone(), parsed)
        })
        .collect();
    filter_active(&repos, window_days, now)
}

/// Filter and report the outcome through `on_progress`.
pub fn filter_and_report(
    repos: &[RepositoryRef],
    window_days: i64,
    now: DateTime<Utc>,
    on_progress: Option<&ProgressCallback>,
) -> Vec<String> {
    let active = filter_active(repos, window_days, now);
    report(&active, repos.len(), window_days, on_progress);
    active
}

/// [`filter_and_report`] over `(name, pushed_at)` pairs.
pub fn filter_pairs_and_report(
    pairs: &[(String, Option<String>)],
    window_days: i64,
    now: DateTime<Utc>,
    on_progress: Option<&ProgressCallback>,
) -> Vec<String> {
    let active = filter_active_pairs(pairs, window_days, now);
    report(&active, pairs.len(), window_days, on_progress);
    active
}

fn report(
    active: &[String],
    total: usize,
    window_days: i64,
    on_progress: Option<&ProgressCallback>,
) {
    tracing::info!(
        matched = active.len(),
        total,
        days = window_days,
        "Filtered repositories by recent activity"
    );
    emit(
        on_progress,
        PulseProgress::FilterComplete {
            matched: active.len(),
            total,
            days: window_days,
        },
    );
}

/// Look up the viewer's newest repositories and keep the active ones.
///
/// This is the standalone path used when no discovery result is at hand.
pub async fn discover_active(
    executor: &dyn GraphQlExecutor,
    options: &PulseOptions,
    now: DateTime<Utc>,
    on_progress: Option<&ProgressCallback>,
) -> Vec<String> {
    let repos = recently_pushed(executor, options, on_progress).await;
    filter_and_report(&repos, options.window_days, now, on_progress)
}
