//! JSON snapshot of the last successful aggregation.
//!
//! Loading is permissive: a missing, unreadable or malformed file is an empty
//! snapshot, missing keys are empty collections, and individual records that
//! do not decode are skipped. Saving replaces the whole file. Neither direction
//! ever returns an error to the caller.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::model::{PrStatus, PullRequestRecord, Snapshot};

#[derive(Debug, Error)]
enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read `path`, falling back to an empty snapshot on any failure.
pub fn load(path: &Path) -> Snapshot {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No snapshot file");
        return Snapshot::default();
    }
    match try_load(path) {
        Ok(snapshot) => {
            tracing::debug!(
                path = %path.display(),
                commits = snapshot.commits.len(),
                pull_requests = snapshot.pull_request_count(),
                "Loaded snapshot"
            );
            snapshot
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable snapshot");
            Snapshot::default()
        }
    }
}

fn try_load(path: &Path) -> Result<Snapshot, SnapshotError> {
    let text = fs::read_to_string(path)?;
    let root: Value = serde_json::from_str(&text)?;
    Ok(Snapshot {
        commits: records(&root, "commits"),
        open_prs: with_status(records(&root, "open_prs"), PrStatus::Open),
        merged_prs: with_status(records(&root, "merged_prs"), PrStatus::Merged),
    })
}

fn records<T: DeserializeOwned>(root: &Value, key: &str) -> Vec<T> {
    let Some(items) = root.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(key, error = %e, "Skipping malformed snapshot record");
                None
            }
        })
        .collect()
}

fn with_status(prs: Vec<PullRequestRecord>, status: PrStatus) -> Vec<PullRequestRecord> {
    prs.into_iter()
        .map(|mut pr| {
            pr.status = status;
            pr
        })
        .collect()
}

/// Overwrite `path` with `snapshot`. Returns whether the write succeeded.
pub fn save(path: &Path, snapshot: &Snapshot) -> bool {
    match try_save(path, snapshot) {
        Ok(()) => {
            tracing::debug!(
                path = %path.display(),
                commits = snapshot.commits.len(),
                pull_requests = snapshot.pull_request_count(),
                "Saved snapshot"
            );
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not save snapshot");
            false
        }
    }
}

fn try_save(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    snapshot.serialize(&mut serializer)?;
    fs::write(path, buf)?;
    Ok(())
}
