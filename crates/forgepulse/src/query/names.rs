//! Validated `owner/name` repository identifiers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Why a repository identifier was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoNameError {
    #[error("repository name '{0}' is missing the owner/name separator")]
    MissingSeparator(String),

    #[error("repository name '{0}' has an empty owner or name")]
    EmptySegment(String),

    #[error("repository name '{input}' contains invalid character {ch:?}")]
    InvalidCharacter { input: String, ch: char },
}

/// A repository identifier that is safe to place in a GraphQL string literal.
///
/// Owners allow ASCII alphanumerics, `-` and `_`. Names additionally allow `.`.
/// Anything else (quotes, whitespace, braces, a second `/`) is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoName {
    owner: String,
    name: String,
}

impl RepoName {
    pub fn parse(input: &str) -> Result<Self, RepoNameError> {
        let (owner, name) = input
            .split_once('/')
            .ok_or_else(|| RepoNameError::MissingSeparator(input.to_string()))?;

        if owner.is_empty() || name.is_empty() {
            return Err(RepoNameError::EmptySegment(input.to_string()));
        }

        let invalid = owner
            .chars()
            .find(|c| !is_owner_char(*c))
            .or_else(|| name.chars().find(|c| !is_name_char(*c)));
        if let Some(ch) = invalid {
            return Err(RepoNameError::InvalidCharacter {
                input: input.to_string(),
                ch,
            });
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

fn is_owner_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn is_name_char(c: char) -> bool {
    is_owner_char(c) || c == '.'
}

impl FromStr for RepoName {
    type Err = RepoNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
