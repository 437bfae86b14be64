//! GraphQL executor error types.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by a single GraphQL round trip.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request was rejected before anything was sent.
    #[error("Invalid GraphQL request: {0}")]
    InvalidRequest(String),

    /// The exchange exceeded its time bound.
    #[error("Request timed out after {} seconds", after.as_secs())]
    Timeout { after: Duration },

    /// Network failure before a response arrived.
    #[error("GraphQL request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success HTTP status.
    #[error("GraphQL request failed with HTTP {status}")]
    Status { status: u16 },

    /// The body was not a JSON document.
    #[error("GraphQL response was not valid JSON: {0}")]
    Decode(String),
}

/// Coarse classification of a [`QueryError`] for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Transport,
    InvalidRequest,
}

impl QueryError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            QueryError::Timeout { .. } => FailureKind::Timeout,
            QueryError::InvalidRequest(_) => FailureKind::InvalidRequest,
            QueryError::Transport(_) | QueryError::Status { .. } | QueryError::Decode(_) => {
                FailureKind::Transport
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind() == FailureKind::Timeout
    }
}

/// Extract a short error message suitable for display.
///
/// Takes the first line of an error message, which keeps multi-line transport
/// errors readable in progress output.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_the_bound() {
        let err = QueryError::Timeout {
            after: Duration::from_secs(45),
        };
        assert_eq!(err.to_string(), "Request timed out after 45 seconds");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_kind_groups_transport_failures() {
        assert_eq!(
            QueryError::Transport("connection refused".to_string()).kind(),
            FailureKind::Transport
        );
        assert_eq!(
            QueryError::Status { status: 502 }.kind(),
            FailureKind::Transport
        );
        assert_eq!(
            QueryError::Decode("EOF".to_string()).kind(),
            FailureKind::Transport
        );
        assert_eq!(
            QueryError::InvalidRequest("empty".to_string()).kind(),
            FailureKind::InvalidRequest
        );
    }

    #[test]
    fn test_short_error_message_keeps_first_line() {
        let err = QueryError::Transport("dns failure\ncaused by: lookup".to_string());
        assert_eq!(
            short_error_message(&err),
            "GraphQL request failed: dns failure"
        );
    }
}
