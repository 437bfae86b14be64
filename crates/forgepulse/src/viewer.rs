//! Profile of the authenticated user.

use serde_json::Value;

use crate::fields::{count_or_zero, lookup, optional_text, required_str};
use crate::graphql::{GraphQlExecutor, fetch_data};
use crate::model::ViewerProfile;
use crate::options::PulseOptions;
use crate::progress::ProgressCallback;
use crate::query::{Document, Field};

fn profile_document() -> Document {
    let total = |name: &str| Field::new(name).scalars(&["totalCount"]);
    Document::query().select(
        Field::new("viewer")
            .scalars(&["login", "name", "company", "location"])
            .select(total("repositories"))
            .select(total("followers"))
            .select(total("following"))
            .select(
                Field::new("contributionsCollection")
                    .scalars(&["totalCommitContributions", "totalPullRequestContributions"]),
            ),
    )
}

/// Build a profile from a `viewer` object. Counts default to zero.
pub fn profile_from_value(viewer: &Value) -> Option<ViewerProfile> {
    let login = required_str(viewer, &["login"])?;
    Some(ViewerProfile {
        login: login.to_string(),
        name: optional_text(viewer, &["name"]),
        company: optional_text(viewer, &["company"]),
        location: optional_text(viewer, &["location"]),
        repositories: count_or_zero(viewer, &["repositories", "totalCount"]),
        followers: count_or_zero(viewer, &["followers", "totalCount"]),
        following: count_or_zero(viewer, &["following", "totalCount"]),
        commit_contributions: count_or_zero(
            viewer,
            &["contributionsCollection", "totalCommitContributions"],
        ),
        pull_request_contributions: count_or_zero(
            viewer,
            &["contributionsCollection", "totalPullRequestContributions"],
        ),
    })
}

/// Fetch the viewer's profile. Any failure yields `None`.
pub async fn fetch_viewer_profile(
    executor: &dyn GraphQlExecutor,
    options: &PulseOptions,
    on_progress: Option<&ProgressCallback>,
) -> Option<ViewerProfile> {
    let request = match profile_document().to_request() {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Could not build viewer query");
            return None;
        }
    };
    let data = fetch_data(executor, &request, options.discovery_timeout, on_progress).await?;
    let profile = lookup(&data, &["viewer"]).and_then(profile_from_value);
    if profile.is_none() {
        tracing::warn!("Viewer profile missing from response");
    }
    profile
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_profile_document_selects_counts() {
        let text = profile_document().render().expect("render");
        assert!(text.contains("contributionsCollection {"));
        assert!(text.contains("totalPullRequestContributions"));
        assert!(text.contains("followers {\n      totalCount\n    }"));
    }

    #[test]
    fn test_profile_from_value_defaults_missing_fields() {
        let profile = profile_from_value(&json!({
            "login": "ada",
            "name": null,
            "company": "Analytical Engines",
            "followers": {"totalCount": 10},
            "contributionsCollection": {"totalCommitContributions": 321}
        }))
        .expect("profile");

        assert_eq!(profile.login, "ada");
        assert_eq!(profile.name, None);
        assert_eq!(profile.company.as_deref(), Some("Analytical Engines"));
        assert_eq!(profile.followers, 10);
        assert_eq!(profile.following, 0);
        assert_eq!(profile.commit_contributions, 321);
        assert_eq!(profile.pull_request_contributions, 0);
    }

    #[test]
    fn test_profile_requires_login() {
        assert!(profile_from_value(&json!({"name": "Nobody"})).is_none());
    }
}
