//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use forgepulse::{GraphQlExecutor, GraphQlRequest, ProgressCallback, PulseProgress, QueryError};
use serde_json::{Value, json};

/// One repository node: `(nameWithOwner, pushedAt)`.
pub type RepoNode = (&'static str, Option<&'static str>);

/// In-memory GitHub that answers the queries this crate sends.
///
/// Paged connections are split into pages whose cursors are `page-{n}`.
#[derive(Default)]
pub struct FakeGitHub {
    pub viewer_pages: Vec<Vec<RepoNode>>,
    pub organizations: Vec<&'static str>,
    /// `None` makes the organization resolve to `null`.
    pub org_pages: HashMap<&'static str, Option<Vec<Vec<RepoNode>>>>,
    /// Batch sub-results by full name. Missing names resolve to `null`.
    pub repositories: HashMap<String, Value>,
    /// Every paged connection claims another page exists.
    pub endless_pages: bool,
    /// Fail every request with a timeout.
    pub timeout_everything: bool,
    requests: Mutex<Vec<GraphQlRequest>>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<GraphQlRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn queries_containing(&self, needle: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.query().contains(needle))
            .count()
    }

    fn page_index(request: &GraphQlRequest) -> usize {
        request
            .variables()
            .and_then(|v| v.get("endCursor"))
            .and_then(Value::as_str)
            .and_then(|c| c.strip_prefix("page-"))
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }

    fn connection(&self, pages: &[Vec<Value>], index: usize) -> Value {
        let nodes = pages.get(index).cloned().unwrap_or_default();
        let has_next = self.endless_pages || index + 1 < pages.len();
        json!({
            "nodes": nodes,
            "pageInfo": {"hasNextPage": has_next, "endCursor": format!("page-{}", index + 1)}
        })
    }

    fn repo_pages(pages: &[Vec<RepoNode>]) -> Vec<Vec<Value>> {
        pages
            .iter()
            .map(|page| {
                page.iter()
                    .map(|(name, pushed)| json!({"nameWithOwner": name, "pushedAt": pushed}))
                    .collect()
            })
            .collect()
    }

    fn respond(&self, request: &GraphQlRequest) -> Value {
        let query = request.query();
        let index = Self::page_index(request);

        if query.contains("fragment repositoryDataFields") {
            let mut data = serde_json::Map::new();
            for (alias, full_name) in batch_aliases(query) {
                let repo = self.repositories.get(&full_name).cloned().unwrap_or(Value::Null);
                data.insert(alias, repo);
            }
            return json!({"data": data});
        }

        if query.contains("organization(login: $orgLogin)") {
            let login = request
                .variables()
                .and_then(|v| v.get("orgLogin"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            return match self.org_pages.get(login) {
                Some(Some(pages)) => json!({"data": {"organization": {
                    "repositories": self.connection(&Self::repo_pages(pages), index)
                }}}),
                _ => json!({
                    "data": {"organization": null},
                    "errors": [{"message": format!("Could not resolve to an Organization with the login of '{login}'.")}]
                }),
            };
        }

        if query.contains("organizations(") {
            let pages = vec![
                self.organizations
                    .iter()
                    .map(|login| json!({"login": login}))
                    .collect::<Vec<_>>(),
            ];
            return json!({"data": {"viewer": {"organizations": self.connection(&pages, index)}}});
        }

        if query.contains("repositories(") {
            let pages = Self::repo_pages(&self.viewer_pages);
            return json!({"data": {"viewer": {"repositories": self.connection(&pages, index)}}});
        }

        json!({"errors": [{"message": "unsupported query"}]})
    }
}

/// `(alias, owner/name)` for every aliased repository in a batch document.
pub fn batch_aliases(query: &str) -> Vec<(String, String)> {
    query
        .lines()
        .filter_map(|line| {
            let (alias, rest) = line.trim().split_once(": repository(owner: \"")?;
            let (owner, rest) = rest.split_once("\", name: \"")?;
            let (name, _) = rest.split_once('"')?;
            Some((alias.to_string(), format!("{owner}/{name}")))
        })
        .collect()
}

#[async_trait]
impl GraphQlExecutor for FakeGitHub {
    async fn execute(
        &self,
        request: &GraphQlRequest,
        timeout: Duration,
    ) -> Result<Value, QueryError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        if self.timeout_everything {
            return Err(QueryError::Timeout { after: timeout });
        }
        Ok(self.respond(request))
    }
}

fn history_nodes(full_name: &str, commits: &[(&str, &str)]) -> Vec<Value> {
    commits
        .iter()
        .map(|(oid, date)| {
            json!({
                "oid": oid,
                "messageHeadline": format!("commit {oid}"),
                "committedDate": date,
                "author": {"name": "Ada", "email": "ada@example.com"},
                "url": format!("https://github.com/{full_name}/commit/{oid}")
            })
        })
        .collect()
}

/// A dashboard-shaped repository result.
pub fn dashboard_result(
    full_name: &str,
    commits: &[(&str, &str)],
    open_prs: &[(u64, &str)],
    merged_prs: &[(u64, &str)],
) -> Value {
    let pr_nodes = |prs: &[(u64, &str)], field: &str| -> Vec<Value> {
        prs.iter()
            .map(|(number, date)| {
                let mut node = json!({
                    "number": number,
                    "title": format!("PR {number}"),
                    "url": format!("https://github.com/{full_name}/pull/{number}"),
                    "author": {"login": "bob"}
                });
                node[field] = json!(date);
                node
            })
            .collect()
    };
    json!({
        "nameWithOwner": full_name,
        "url": format!("https://github.com/{full_name}"),
        "defaultBranchRef": {"name": "main", "target": {"history": {"nodes": history_nodes(full_name, commits)}}},
        "openPRs": {"nodes": pr_nodes(open_prs, "createdAt")},
        "mergedPRs": {"nodes": pr_nodes(merged_prs, "mergedAt")}
    })
}

/// A commit-stream-shaped repository result with one ref per branch.
pub fn stream_result(full_name: &str, branches: &[(&str, &[(&str, &str)])]) -> Value {
    let refs: Vec<Value> = branches
        .iter()
        .map(|(branch, commits)| {
            json!({"name": branch, "target": {"history": {"nodes": history_nodes(full_name, commits)}}})
        })
        .collect();
    json!({
        "nameWithOwner": full_name,
        "url": format!("https://github.com/{full_name}"),
        "refs": {"nodes": refs}
    })
}

/// Callback that records every event.
pub fn recording_callback() -> (ProgressCallback, Arc<Mutex<Vec<PulseProgress>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let callback: ProgressCallback = Box::new(move |event| {
        sink.lock().expect("events lock").push(event);
    });
    (callback, events)
}
