//! Batched repository queries.
//!
//! One document fetches many repositories through positional aliases. Two
//! shapes exist: the dashboard shape (default-branch history plus open and
//! merged pull requests) and the commit-stream shape (history per branch).

use std::time::{Duration, Instant};

use crate::graphql::{GraphQlExecutor, fetch_data};
use crate::model::{ActivityData, CommitRecord};
use crate::options::PulseOptions;
use crate::parse::{alias_for, parse_batch};
use crate::progress::{ProgressCallback, PulseProgress, emit};
use crate::query::{Arg, Document, Field, Fragment, RepoName, Selection};

const REPOSITORY_FRAGMENT: &str = "repositoryDataFields";
const COMMIT_FIELDS: &[&str] = &["oid", "messageHeadline", "committedDate", "url"];
const PULL_REQUEST_FIELDS: &[&str] = &["number", "title", "url", "createdAt", "mergedAt", "state"];

/// What each aliased repository sub-query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchShape {
    /// Default-branch history plus open and merged pull requests.
    Dashboard {
        commits_per_repo: usize,
        pr_limit: usize,
    },
    /// History of the most recently updated branches.
    CommitStream {
        commits_per_repo: usize,
        branches: usize,
    },
}

impl BatchShape {
    fn commits_per_repo(self) -> usize {
        match self {
            BatchShape::Dashboard {
                commits_per_repo, ..
            }
            | BatchShape::CommitStream {
                commits_per_repo, ..
            } => commits_per_repo,
        }
    }
}

/// Even share of `total_budget` across `batch_len` repositories, capped.
pub fn commit_allotment(total_budget: usize, batch_len: usize, per_repo_cap: usize) -> usize {
    if batch_len == 0 {
        return 0;
    }
    (total_budget / batch_len).min(per_repo_cap)
}

/// Keep the first `max_repos` names and validate them.
///
/// Positions are kept so that aliases stay tied to the input order. Malformed
/// names are dropped with a warning.
pub fn select_batch(repo_names: &[String], max_repos: usize) -> Vec<(usize, RepoName)> {
    if repo_names.len() > max_repos {
        tracing::debug!(
            requested = repo_names.len(),
            max_repos,
            "Truncating batch to most recently pushed repositories"
        );
    }
    repo_names
        .iter()
        .take(max_repos)
        .enumerate()
        .filter_map(|(i, raw)| match RepoName::parse(raw) {
            Ok(name) => Some((i, name)),
            Err(e) => {
                tracing::warn!(repo = %raw, error = %e, "Skipping malformed repository name");
                None
            }
        })
        .collect()
}

fn history(commits: usize) -> Field {
    Field::new("target").select(Selection::on(
        "Commit",
        vec![
            Field::new("history")
                .arg("first", commits)
                .select(
                    Field::new("nodes")
                        .scalars(COMMIT_FIELDS)
                        .select(Field::new("author").scalars(&["name", "email"])),
                )
                .into(),
        ],
    ))
}

fn pull_requests(alias: &str, state: &str, limit: usize) -> Field {
    Field::new("pullRequests")
        .alias(alias)
        .arg("states", Arg::enums(&[state]))
        .arg("first", limit)
        .arg("orderBy", Arg::order_by("CREATED_AT", "DESC"))
        .select(
            Field::new("nodes")
                .scalars(PULL_REQUEST_FIELDS)
                .select(Field::new("author").scalars(&["login"])),
        )
}

fn repository_fragment(shape: BatchShape) -> Fragment {
    let base = Fragment::new(REPOSITORY_FRAGMENT, "Repository").scalars(&["nameWithOwner", "url"]);
    match shape {
        BatchShape::Dashboard {
            commits_per_repo,
            pr_limit,
        } => base
            .select(pull_requests("openPRs", "OPEN", pr_limit))
            .select(pull_requests("mergedPRs", "MERGED", pr_limit))
            .select(
                Field::new("defaultBranchRef")
                    .scalars(&["name"])
                    .select(history(commits_per_repo)),
            ),
        BatchShape::CommitStream {
            commits_per_repo,
            branches,
        } => base.select(
            Field::new("refs")
                .arg("refPrefix", Arg::str("refs/heads/"))
                .arg("first", branches)
                .arg("orderBy", Arg::order_by("TAG_COMMIT_DATE", "DESC"))
                .select(
                    Field::new("nodes")
                        .scalars(&["name"])
                        .select(history(commits_per_repo)),
                ),
        ),
    }
}

/// One document with a `repo{i}` alias per selected repository.
pub fn build_batch_document(batch: &[(usize, RepoName)], shape: BatchShape) -> Document {
    batch
        .iter()
        .fold(Document::query(), |doc, (i, repo)| {
            doc.select(
                Field::new("repository")
                    .alias(alias_for(*i))
                    .arg("owner", Arg::str(repo.owner()))
                    .arg("name", Arg::str(repo.name()))
                    .select(Selection::spread(REPOSITORY_FRAGMENT)),
            )
        })
        .fragment(repository_fragment(shape))
}

/// Query up to `max_repos` repositories in one round trip and flatten the result.
///
/// Any failure, or an empty batch after validation, yields empty collections.
pub async fn build_and_run(
    executor: &dyn GraphQlExecutor,
    repo_names: &[String],
    shape: BatchShape,
    max_repos: usize,
    timeout: Duration,
    on_progress: Option<&ProgressCallback>,
) -> ActivityData {
    let batch = select_batch(repo_names, max_repos);
    run_batch(executor, &batch, shape, timeout, on_progress).await
}

/// Query an already selected batch in one round trip.
pub async fn run_batch(
    executor: &dyn GraphQlExecutor,
    batch: &[(usize, RepoName)],
    shape: BatchShape,
    timeout: Duration,
    on_progress: Option<&ProgressCallback>,
) -> ActivityData {
    if batch.is_empty() {
        tracing::debug!("No valid repositories to query");
        return ActivityData::default();
    }

    let request = match build_batch_document(batch, shape).to_request() {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Could not build batch query");
            return ActivityData::default();
        }
    };

    tracing::debug!(
        repositories = batch.len(),
        commits_per_repo = shape.commits_per_repo(),
        timeout_secs = timeout.as_secs(),
        "Sending batch query"
    );
    emit(
        on_progress,
        PulseProgress::BatchQueryStarted {
            repositories: batch.len(),
            commits_per_repo: shape.commits_per_repo(),
        },
    );

    let started = Instant::now();
    let Some(data) = fetch_data(executor, &request, timeout, on_progress).await else {
        return ActivityData::default();
    };
    let parsed = parse_batch(&data);
    let elapsed_ms = started.elapsed().as_millis() as u64;

    tracing::info!(
        commits = parsed.commits.len(),
        open_prs = parsed.open_prs.len(),
        merged_prs = parsed.merged_prs.len(),
        elapsed_ms,
        "Batch query complete"
    );
    emit(
        on_progress,
        PulseProgress::BatchQueryComplete {
            commits: parsed.commits.len(),
            open_prs: parsed.open_prs.len(),
            merged_prs: parsed.merged_prs.len(),
            elapsed_ms,
        },
    );
    parsed
}

/// Dashboard batch over the first `repo_fetch_limit` names.
pub async fn fetch_dashboard(
    executor: &dyn GraphQlExecutor,
    repo_names: &[String],
    options: &PulseOptions,
    on_progress: Option<&ProgressCallback>,
) -> ActivityData {
    build_and_run(
        executor,
        repo_names,
        BatchShape::Dashboard {
            commits_per_repo: options.commits_per_repo,
            pr_limit: options.pr_limit,
        },
        options.repo_fetch_limit,
        options.batch_timeout,
        on_progress,
    )
    .await
}

/// Per-branch commits across at most `max_batch_repos` repositories.
pub async fn fetch_commit_stream(
    executor: &dyn GraphQlExecutor,
    repo_names: &[String],
    options: &PulseOptions,
    on_progress: Option<&ProgressCallback>,
) -> Vec<CommitRecord> {
    let batch = select_batch(repo_names, options.max_batch_repos);
    let commits_per_repo =
        commit_allotment(options.commit_budget, batch.len(), options.per_repo_cap);
    if commits_per_repo == 0 {
        return Vec::new();
    }

    run_batch(
        executor,
        &batch,
        BatchShape::CommitStream {
            commits_per_repo,
            branches: options.branches_per_repo,
        },
        options.batch_timeout,
        on_progress,
    )
    .await
    .commits
}
