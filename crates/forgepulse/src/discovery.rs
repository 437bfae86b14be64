//! Repository discovery across the viewer's affiliations and organizations.
//!
//! Every connection is paged with its `endCursor` until the server reports no
//! further pages or the page ceiling in [`PulseOptions::max_pages`] is reached.
//! Results are merged by full name, last write wins, then sorted by push date.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::{Value, json};

use crate::fields::{lookup, required_str};
use crate::graphql::{GraphQlExecutor, fetch_data};
use crate::model::{OrganizationRef, RepositoryRef};
use crate::options::{OrgScope, PAGE_SIZE, PulseOptions};
use crate::progress::{ProgressCallback, PulseProgress, emit};
use crate::query::{Arg, Document, Field};
use crate::timeline::{parse_timestamp, sort_newest_first};

/// Namespace label for the viewer's own affiliations.
pub const VIEWER_NAMESPACE: &str = "viewer";

/// Result of one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    /// Distinct repositories, most recently pushed first.
    pub repositories: Vec<RepositoryRef>,
    /// Organizations whose repositories were requested.
    pub organizations: Vec<String>,
    /// False when any connection stopped early (page ceiling or failed page).
    pub complete: bool,
}

impl DiscoveryOutcome {
    /// Repository names in discovery order.
    pub fn names(&self) -> Vec<String> {
        self.repositories
            .iter()
            .map(|r| r.full_name.clone())
            .collect()
    }
}

/// A paginated connection we know how to query.
#[derive(Debug, Clone)]
enum Connection<'a> {
    ViewerRepositories,
    ViewerOrganizations,
    OrganizationRepositories(&'a str),
}

impl Connection<'_> {
    fn namespace(&self) -> &str {
        match self {
            Connection::ViewerRepositories | Connection::ViewerOrganizations => VIEWER_NAMESPACE,
            Connection::OrganizationRepositories(login) => login,
        }
    }

    fn document(&self) -> Document {
        let page_info = Field::new("pageInfo").scalars(&["hasNextPage", "endCursor"]);
        let repo_nodes = Field::new("nodes").scalars(&["nameWithOwner", "pushedAt"]);

        match self {
            Connection::ViewerRepositories => Document::query()
                .variable("endCursor", "String")
                .select(
                    Field::new("viewer").select(
                        Field::new("repositories")
                            .arg("first", PAGE_SIZE)
                            .arg("after", Arg::var("endCursor"))
                            .arg(
                                "affiliations",
                                Arg::enums(&["OWNER", "COLLABORATOR", "ORGANIZATION_MEMBER"]),
                            )
                            .arg("orderBy", Arg::order_by("PUSHED_AT", "DESC"))
                            .select(repo_nodes)
                            .select(page_info),
                    ),
                ),
            Connection::ViewerOrganizations => Document::query()
                .variable("endCursor", "String")
                .select(
                    Field::new("viewer").select(
                        Field::new("organizations")
                            .arg("first", PAGE_SIZE)
                            .arg("after", Arg::var("endCursor"))
                            .select(Field::new("nodes").scalars(&["login"]))
                            .select(page_info),
                    ),
                ),
            Connection::OrganizationRepositories(_) => Document::query()
                .variable("orgLogin", "String!")
                .variable("endCursor", "String")
                .select(
                    Field::new("organization")
                        .arg("login", Arg::var("orgLogin"))
                        .select(
                            Field::new("repositories")
                                .arg("first", PAGE_SIZE)
                                .arg("after", Arg::var("endCursor"))
                                .arg("orderBy", Arg::order_by("PUSHED_AT", "DESC"))
                                .select(repo_nodes)
                                .select(page_info),
                        ),
                ),
        }
    }

    fn variables(&self, cursor: Option<&str>) -> Value {
        match self {
            Connection::OrganizationRepositories(login) => {
                json!({"orgLogin": login, "endCursor": cursor})
            }
            _ => json!({"endCursor": cursor}),
        }
    }

    fn extract<'v>(&self, data: &'v Value) -> Option<&'v Value> {
        let path: &[&str] = match self {
            Connection::ViewerRepositories => &["viewer", "repositories"],
            Connection::ViewerOrganizations => &["viewer", "organizations"],
            Connection::OrganizationRepositories(_) => &["organization", "repositories"],
        };
        lookup(data, path)
    }
}

/// Nodes collected from one connection.
#[derive(Debug, Default)]
struct PageRun {
    nodes: Vec<Value>,
    /// Every page up to the last one was read.
    complete: bool,
    /// The connection existed (an unresolvable organization yields `false`).
    resolved: bool,
}

async fn collect_pages(
    executor: &dyn GraphQlExecutor,
    connection: &Connection<'_>,
    options: &PulseOptions,
    on_progress: Option<&ProgressCallback>,
) -> PageRun {
    let namespace = connection.namespace().to_string();
    let request = match connection.document().to_request() {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(namespace = %namespace, error = %e, "Could not build discovery query");
            return PageRun::default();
        }
    };

    let mut run = PageRun {
        complete: true,
        resolved: true,
        ..Default::default()
    };
    let mut cursor: Option<String> = None;
    let mut page: u32 = 0;

    loop {
        if page >= options.max_pages {
            tracing::warn!(
                namespace = %namespace,
                pages = page,
                "Page ceiling reached before the last page, discovery is incomplete"
            );
            emit(
                on_progress,
                PulseProgress::DiscoveryTruncated {
                    namespace: namespace.clone(),
                    pages: page,
                },
            );
            run.complete = false;
            break;
        }
        page += 1;

        let paged = request
            .clone()
            .with_variables(connection.variables(cursor.as_deref()));
        let Some(data) =
            fetch_data(executor, &paged, options.discovery_timeout, on_progress).await
        else {
            run.complete = false;
            run.resolved = page > 1;
            break;
        };

        let Some(conn) = connection.extract(&data) else {
            tracing::debug!(namespace = %namespace, "Connection not resolvable");
            run.resolved = false;
            break;
        };

        let nodes = conn
            .get("nodes")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        tracing::debug!(namespace = %namespace, page, count = nodes.len(), "Fetched page");
        emit(
            on_progress,
            PulseProgress::FetchedPage {
                namespace: namespace.clone(),
                page,
                count: nodes.len(),
            },
        );
        run.nodes.extend(nodes);

        let has_next = lookup(conn, &["pageInfo", "hasNextPage"])
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let end_cursor = required_str(conn, &["pageInfo", "endCursor"]);
        match (has_next, end_cursor) {
            (true, Some(next)) => cursor = Some(next.to_string()),
            _ => break,
        }
    }

    run
}

fn repository_from_node(node: &Value) -> Option<RepositoryRef> {
    let Some(full_name) = required_str(node, &["nameWithOwner"]) else {
        tracing::warn!("Skipping repository node without nameWithOwner");
        return None;
    };
    let pushed_at = match required_str(node, &["pushedAt"]) {
        None => None,
        Some(raw) => {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                tracing::warn!(repo = %full_name, pushed_at = %raw, "Unparseable push date");
            }
            parsed
        }
    };
    Some(RepositoryRef::new(full_name, pushed_at))
}

/// Insertion-ordered map of repositories, last write wins.
#[derive(Debug, Default)]
struct RepoSet {
    repos: Vec<RepositoryRef>,
    index: HashMap<String, usize>,
}

impl RepoSet {
    fn insert(&mut self, repo: RepositoryRef) {
        match self.index.get(&repo.full_name) {
            Some(&i) => self.repos[i] = repo,
            None => {
                self.index.insert(repo.full_name.clone(), self.repos.len());
                self.repos.push(repo);
            }
        }
    }

    fn extend_from_nodes(&mut self, nodes: &[Value]) {
        for repo in nodes.iter().filter_map(repository_from_node) {
            self.insert(repo);
        }
    }

    fn into_sorted(self) -> Vec<RepositoryRef> {
        let mut repos = self.repos;
        sort_newest_first(&mut repos);
        repos
    }
}

/// Every organization the viewer belongs to.
///
/// The flag is false when the listing stopped early.
pub async fn list_organizations(
    executor: &dyn GraphQlExecutor,
    options: &PulseOptions,
    on_progress: Option<&ProgressCallback>,
) -> (Vec<OrganizationRef>, bool) {
    let run = collect_pages(executor, &Connection::ViewerOrganizations, options, on_progress).await;
    let orgs = run
        .nodes
        .iter()
        .filter_map(|n| required_str(n, &["login"]))
        .map(|login| OrganizationRef {
            login: login.to_string(),
        })
        .collect();
    (orgs, run.complete)
}

/// Enumerate every repository visible through `scope`, newest push first.
pub async fn discover(
    executor: &dyn GraphQlExecutor,
    scope: &OrgScope,
    options: &PulseOptions,
    on_progress: Option<&ProgressCallback>,
) -> DiscoveryOutcome {
    let started = Instant::now();
    let mut set = RepoSet::default();

    emit(
        on_progress,
        PulseProgress::DiscoveringRepos {
            namespace: VIEWER_NAMESPACE.to_string(),
        },
    );
    let viewer = collect_pages(
        executor,
        &Connection::ViewerRepositories,
        options,
        on_progress,
    )
    .await;
    let mut complete = viewer.complete;
    set.extend_from_nodes(&viewer.nodes);

    let organizations: Vec<String> = match scope {
        OrgScope::All => {
            let (orgs, listed) = list_organizations(executor, options, on_progress).await;
            complete &= listed;
            orgs.into_iter().map(|o| o.login).collect()
        }
        OrgScope::Explicit(logins) => logins.clone(),
    };

    for login in &organizations {
        emit(
            on_progress,
            PulseProgress::DiscoveringRepos {
                namespace: login.clone(),
            },
        );
        let run = collect_pages(
            executor,
            &Connection::OrganizationRepositories(login),
            options,
            on_progress,
        )
        .await;
        complete &= run.complete;

        if !run.resolved {
            tracing::warn!(org = %login, "Organization contributed no repositories");
            emit(
                on_progress,
                PulseProgress::OrganizationSkipped {
                    login: login.clone(),
                },
            );
            continue;
        }
        set.extend_from_nodes(&run.nodes);
    }

    let repositories = set.into_sorted();
    tracing::info!(
        total = repositories.len(),
        organizations = organizations.len(),
        complete,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Repository discovery complete"
    );
    emit(
        on_progress,
        PulseProgress::DiscoveryComplete {
            total: repositories.len(),
            organizations: organizations.len(),
        },
    );

    DiscoveryOutcome {
        repositories,
        organizations,
        complete,
    }
}

/// One page of the viewer's most recently pushed repositories.
///
/// Used by the standalone commit stream, which only needs the newest few.
pub async fn recently_pushed(
    executor: &dyn GraphQlExecutor,
    options: &PulseOptions,
    on_progress: Option<&ProgressCallback>,
) -> Vec<RepositoryRef> {
    let document = Document::query().select(
        Field::new("viewer").select(
            Field::new("repositories")
                .arg("first", options.stream_scan_limit.min(PAGE_SIZE))
                .arg("orderBy", Arg::order_by("PUSHED_AT", "DESC"))
                .arg(
                    "affiliations",
                    Arg::enums(&["OWNER", "COLLABORATOR", "ORGANIZATION_MEMBER"]),
                )
                .select(Field::new("nodes").scalars(&["nameWithOwner", "pushedAt"])),
        ),
    );
    let request = match document.to_request() {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Could not build repository scan query");
            return Vec::new();
        }
    };

    let Some(data) = fetch_data(executor, &request, options.discovery_timeout, on_progress).await
    else {
        return Vec::new();
    };

    let repos: Vec<RepositoryRef> = lookup(&data, &["viewer", "repositories", "nodes"])
        .and_then(Value::as_array)
        .map(|nodes| nodes.iter().filter_map(repository_from_node).collect())
        .unwrap_or_default();
    tracing::debug!(count = repos.len(), "Scanned recently pushed repositories");
    repos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, pushed: Option<&str>) -> Value {
        json!({"nameWithOwner": name, "pushedAt": pushed})
    }

    #[test]
    fn test_repo_set_last_write_wins_and_keeps_first_position() {
        let mut set = RepoSet::default();
        set.extend_from_nodes(&[
            node("acme/core", Some("2025-01-02T00:00:00Z")),
            node("acme/web", Some("2025-01-03T00:00:00Z")),
        ]);
        set.extend_from_nodes(&[node("acme/core", Some("2025-01-01T00:00:00Z"))]);

        assert_eq!(set.repos.len(), 2);
        assert_eq!(set.repos[0].full_name, "acme/core");
        assert_eq!(
            set.repos[0].last_pushed_at,
            parse_timestamp("2025-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_repository_from_node_tolerates_bad_push_dates() {
        let repo = repository_from_node(&node("acme/core", Some("garbage"))).expect("kept");
        assert_eq!(repo.last_pushed_at, None);
        assert!(repository_from_node(&json!({"pushedAt": null})).is_none());
    }

    #[test]
    fn test_into_sorted_orders_by_push_date_with_missing_last() {
        let mut set = RepoSet::default();
        set.extend_from_nodes(&[
            node("a/never", None),
            node("a/old", Some("2024-06-01T00:00:00Z")),
            node("a/new", Some("2025-06-01T00:00:00Z")),
        ]);
        let names: Vec<String> = set.into_sorted().into_iter().map(|r| r.full_name).collect();
        assert_eq!(names, vec!["a/new", "a/old", "a/never"]);
    }

    #[test]
    fn test_connection_documents_render() {
        let viewer = Connection::ViewerRepositories.document().render().expect("render");
        assert!(viewer.contains(
            "repositories(first: 100, after: $endCursor, affiliations: [OWNER, COLLABORATOR, ORGANIZATION_MEMBER], orderBy: {field: PUSHED_AT, direction: DESC})"
        ));

        let org = Connection::OrganizationRepositories("acme")
            .document()
            .render()
            .expect("render");
        assert!(org.starts_with("query($orgLogin: String!, $endCursor: String)"));
        assert!(org.contains("organization(login: $orgLogin)"));

        assert_eq!(
            Connection::OrganizationRepositories("acme").variables(Some("Y3Vy")),
            json!({"orgLogin": "acme", "endCursor": "Y3Vy"})
        );
        assert_eq!(
            Connection::ViewerOrganizations.variables(None),
            json!({"endCursor": null})
        );
    }
}
