//! GraphQL query execution.
//!
//! One request, one attempt, one bounded timeout. Failures are classified as
//! [`FailureKind::Timeout`] or [`FailureKind::Transport`] and contained by
//! [`fetch_data`], which callers use whenever a failure should become an empty
//! contribution instead of an error.

mod error;
mod executor;

pub use error::{FailureKind, QueryError, short_error_message};
pub use executor::{
    GITHUB_GRAPHQL_URL, GraphQlExecutor, GraphQlRequest, HttpGraphQlExecutor, error_messages,
    fetch_data,
};
