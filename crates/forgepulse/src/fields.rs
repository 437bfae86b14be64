//! Sentinel defaults for optional response fields.
//!
//! Every optional text field that ends up in a record is read through
//! [`text_or_default`], so a missing author or headline always produces the
//! same placeholder regardless of which query shape returned it.
//!
//! | Field            | Path                    | Default      |
//! |------------------|-------------------------|--------------|
//! | `CommitAuthor`   | `author.name`           | `Unknown`    |
//! | `CommitMessage`  | `messageHeadline`       | `No message` |
//! | `PrAuthor`       | `author.login`          | `Unknown`    |
//! | `PrTitle`        | `title`                 | (empty)      |
//! | `BranchName`     | `name`                  | `main`       |
//! | `Url`            | `url`                   | (empty)      |

use serde_json::Value;

/// Placeholder for an author that could not be resolved.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Placeholder for a commit without a headline.
pub const NO_MESSAGE: &str = "No message";

/// Branch assumed when a ref carries no name.
pub const DEFAULT_BRANCH: &str = "main";

/// An optional text field and its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    CommitAuthor,
    CommitMessage,
    PrAuthor,
    PrTitle,
    BranchName,
    Url,
}

impl TextField {
    /// JSON path relative to the node that owns the field.
    pub const fn path(self) -> &'static [&'static str] {
        match self {
            TextField::CommitAuthor => &["author", "name"],
            TextField::CommitMessage => &["messageHeadline"],
            TextField::PrAuthor => &["author", "login"],
            TextField::PrTitle => &["title"],
            TextField::BranchName => &["name"],
            TextField::Url => &["url"],
        }
    }

    pub const fn default_value(self) -> &'static str {
        match self {
            TextField::CommitAuthor | TextField::PrAuthor => UNKNOWN_AUTHOR,
            TextField::CommitMessage => NO_MESSAGE,
            TextField::BranchName => DEFAULT_BRANCH,
            TextField::PrTitle | TextField::Url => "",
        }
    }
}

/// Walk `path` from `node`, yielding `None` at the first missing or null step.
pub fn lookup<'a>(node: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(node, |current, key| {
        current.get(*key).filter(|v| !v.is_null())
    })
}

/// Read a text field, substituting its default when absent, null or empty.
pub fn text_or_default(node: &Value, field: TextField) -> String {
    lookup(node, field.path())
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(field.default_value())
        .to_string()
}

/// Read a required string at `path`.
pub fn required_str<'a>(node: &'a Value, path: &[&str]) -> Option<&'a str> {
    lookup(node, path).and_then(Value::as_str)
}

/// Read a count at `path`, defaulting to zero.
pub fn count_or_zero(node: &Value, path: &[&str]) -> u64 {
    lookup(node, path).and_then(Value::as_u64).unwrap_or(0)
}

/// Read an optional, non-empty string at `path`.
pub fn optional_text(node: &Value, path: &[&str]) -> Option<String> {
    lookup(node, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_present_value_is_returned() {
        let node = json!({"author": {"name": "Ada"}, "messageHeadline": "Fix"});
        assert_eq!(text_or_default(&node, TextField::CommitAuthor), "Ada");
        assert_eq!(text_or_default(&node, TextField::CommitMessage), "Fix");
    }

    #[test]
    fn test_null_author_uses_sentinel() {
        let node = json!({"author": null});
        assert_eq!(text_or_default(&node, TextField::CommitAuthor), UNKNOWN_AUTHOR);
        assert_eq!(text_or_default(&node, TextField::PrAuthor), UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_missing_and_empty_values_use_sentinel() {
        let node = json!({"messageHeadline": "", "author": {"login": null}});
        assert_eq!(text_or_default(&node, TextField::CommitMessage), NO_MESSAGE);
        assert_eq!(text_or_default(&node, TextField::PrAuthor), UNKNOWN_AUTHOR);
        assert_eq!(text_or_default(&json!({}), TextField::BranchName), DEFAULT_BRANCH);
        assert_eq!(text_or_default(&json!({}), TextField::Url), "");
    }

    #[test]
    fn test_non_string_value_uses_sentinel() {
        let node = json!({"author": {"name": 42}});
        assert_eq!(text_or_default(&node, TextField::CommitAuthor), UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_counts_and_optional_text() {
        let node = json!({"followers": {"totalCount": 12}, "company": "", "location": "Paris"});
        assert_eq!(count_or_zero(&node, &["followers", "totalCount"]), 12);
        assert_eq!(count_or_zero(&node, &["following", "totalCount"]), 0);
        assert_eq!(optional_text(&node, &["company"]), None);
        assert_eq!(optional_text(&node, &["location"]), Some("Paris".to_string()));
    }
}
