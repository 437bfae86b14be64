//! Integration tests for repository discovery.
//!
//! Key scenarios tested:
//! - A repository reachable through the viewer and an organization appears once
//! - Cursor pagination follows `endCursor` until `hasNextPage` is false
//! - The page ceiling stops a server that never stops paging
//! - Unresolvable organizations and failed requests are contained

mod common;

use std::collections::{HashMap, HashSet};

use common::{FakeGitHub, recording_callback};
use forgepulse::timeline::parse_timestamp;
use forgepulse::{OrgScope, PulseOptions, PulseProgress, discover};

fn options() -> PulseOptions {
    PulseOptions::default()
}

#[tokio::test]
async fn test_duplicate_repository_keeps_last_visited_push_date() {
    let mut github = FakeGitHub::new();
    github.viewer_pages = vec![vec![
        ("acme/core", Some("2025-01-02T00:00:00Z")),
        ("ada/dotfiles", Some("2024-12-01T00:00:00Z")),
    ]];
    github.org_pages = HashMap::from([(
        "acme",
        Some(vec![vec![("acme/core", Some("2025-01-01T00:00:00Z"))]]),
    )]);

    let outcome = discover(
        &github,
        &OrgScope::Explicit(vec!["acme".to_string()]),
        &options(),
        None,
    )
    .await;

    let core: Vec<_> = outcome
        .repositories
        .iter()
        .filter(|r| r.full_name == "acme/core")
        .collect();
    assert_eq!(core.len(), 1);
    assert_eq!(
        core[0].last_pushed_at,
        parse_timestamp("2025-01-01T00:00:00Z")
    );
    assert_eq!(outcome.repositories.len(), 2);
    assert!(outcome.complete);
}

#[tokio::test]
async fn test_discovery_is_sorted_and_idempotent() {
    let mut github = FakeGitHub::new();
    github.viewer_pages = vec![
        vec![
            ("ada/old", Some("2023-05-01T00:00:00Z")),
            ("ada/never-pushed", None),
        ],
        vec![("ada/new", Some("2025-02-01T00:00:00Z"))],
    ];
    github.organizations = vec!["acme"];
    github.org_pages = HashMap::from([(
        "acme",
        Some(vec![vec![
            ("acme/mid", Some("2024-06-01T00:00:00Z")),
            ("acme/newer", Some("2025-03-01T00:00:00Z")),
        ]]),
    )]);

    let first = discover(&github, &OrgScope::All, &options(), None).await;
    let second = discover(&github, &OrgScope::All, &options(), None).await;
    assert_eq!(first, second);

    assert_eq!(
        first.names(),
        vec!["acme/newer", "ada/new", "acme/mid", "ada/old", "ada/never-pushed"]
    );
    for pair in first.repositories.windows(2) {
        assert!(pair[0].last_pushed_at >= pair[1].last_pushed_at);
    }
    assert_eq!(first.organizations, vec!["acme".to_string()]);

    let unique: HashSet<_> = first.names().into_iter().collect();
    assert_eq!(unique.len(), first.repositories.len());
}

#[tokio::test]
async fn test_pagination_follows_cursor() {
    let mut github = FakeGitHub::new();
    github.viewer_pages = vec![
        vec![("ada/one", Some("2025-01-01T00:00:00Z"))],
        vec![("ada/two", Some("2025-01-02T00:00:00Z"))],
        vec![("ada/three", Some("2025-01-03T00:00:00Z"))],
    ];

    let outcome = discover(&github, &OrgScope::Explicit(Vec::new()), &options(), None).await;
    assert_eq!(outcome.repositories.len(), 3);

    let cursors: Vec<Option<String>> = github
        .requests()
        .iter()
        .map(|r| {
            r.variables()
                .and_then(|v| v.get("endCursor"))
                .and_then(|c| c.as_str())
                .map(String::from)
        })
        .collect();
    assert_eq!(
        cursors,
        vec![None, Some("page-1".to_string()), Some("page-2".to_string())]
    );
}

#[tokio::test]
async fn test_empty_explicit_scope_skips_organizations() {
    let mut github = FakeGitHub::new();
    github.viewer_pages = vec![vec![("ada/solo", Some("2025-01-01T00:00:00Z"))]];
    github.organizations = vec!["acme"];

    let outcome = discover(&github, &OrgScope::Explicit(Vec::new()), &options(), None).await;
    assert_eq!(outcome.names(), vec!["ada/solo"]);
    assert_eq!(github.queries_containing("organizations("), 0);
    assert_eq!(github.queries_containing("organization(login"), 0);
}

#[tokio::test]
async fn test_page_ceiling_marks_outcome_incomplete() {
    let mut github = FakeGitHub::new();
    github.viewer_pages = vec![vec![("ada/loop", Some("2025-01-01T00:00:00Z"))]];
    github.endless_pages = true;
    let options = PulseOptions {
        max_pages: 3,
        ..PulseOptions::default()
    };
    let (callback, events) = recording_callback();

    let outcome = discover(
        &github,
        &OrgScope::Explicit(Vec::new()),
        &options,
        Some(&callback),
    )
    .await;

    assert!(!outcome.complete);
    assert_eq!(github.requests().len(), 3);
    assert_eq!(outcome.names(), vec!["ada/loop"]);
    assert!(events.lock().unwrap().contains(&PulseProgress::DiscoveryTruncated {
        namespace: "viewer".to_string(),
        pages: 3,
    }));
}

#[tokio::test]
async fn test_unresolvable_organization_is_skipped() {
    let mut github = FakeGitHub::new();
    github.viewer_pages = vec![vec![("ada/solo", Some("2025-01-01T00:00:00Z"))]];
    github.org_pages = HashMap::from([
        ("ghost", None),
        (
            "acme",
            Some(vec![vec![("acme/core", Some("2025-02-01T00:00:00Z"))]]),
        ),
    ]);
    let (callback, events) = recording_callback();

    let outcome = discover(
        &github,
        &OrgScope::Explicit(vec!["ghost".to_string(), "acme".to_string()]),
        &options(),
        Some(&callback),
    )
    .await;

    assert_eq!(outcome.names(), vec!["acme/core", "ada/solo"]);
    assert!(outcome.complete);
    assert!(events.lock().unwrap().contains(&PulseProgress::OrganizationSkipped {
        login: "ghost".to_string()
    }));
}

#[tokio::test]
async fn test_timeouts_yield_empty_discovery_with_warning() {
    let mut github = FakeGitHub::new();
    github.viewer_pages = vec![vec![("ada/solo", Some("2025-01-01T00:00:00Z"))]];
    github.timeout_everything = true;
    let (callback, events) = recording_callback();

    let outcome = discover(&github, &OrgScope::All, &options(), Some(&callback)).await;

    assert!(outcome.repositories.is_empty());
    assert!(!outcome.complete);
    let events = events.lock().unwrap();
    assert!(events.contains(&PulseProgress::Warning {
        message: "Request timed out after 30 seconds".to_string()
    }));
    assert!(events.contains(&PulseProgress::DiscoveryComplete {
        total: 0,
        organizations: 0
    }));
}
