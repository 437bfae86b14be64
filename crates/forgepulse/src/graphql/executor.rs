//! Single-attempt GraphQL execution over an [`HttpTransport`].

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::error::{FailureKind, QueryError, short_error_message};
use crate::http::{HttpError, HttpTransport, JsonPost, ReqwestTransport};
use crate::progress::{ProgressCallback, PulseProgress, emit};

/// Default GitHub GraphQL endpoint.
pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// A GraphQL document plus optional variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlRequest {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<Value>,
}

impl GraphQlRequest {
    /// Build a request, rejecting a blank document.
    pub fn new(query: impl Into<String>) -> Result<Self, QueryError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(QueryError::InvalidRequest(
                "query document is empty".to_string(),
            ));
        }
        Ok(Self {
            query,
            variables: None,
        })
    }

    #[must_use]
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn variables(&self) -> Option<&Value> {
        self.variables.as_ref()
    }
}

/// Sends one GraphQL request and returns the decoded JSON body.
///
/// Implementations make exactly one attempt per call. A body without a `data`
/// key is still `Ok`; callers decide what "no data" means.
#[async_trait]
pub trait GraphQlExecutor: Send + Sync {
    async fn execute(&self, request: &GraphQlRequest, timeout: Duration)
    -> Result<Value, QueryError>;
}

/// [`GraphQlExecutor`] that POSTs to a GraphQL endpoint with a bearer token.
#[derive(Clone)]
pub struct HttpGraphQlExecutor<T = ReqwestTransport> {
    transport: T,
    endpoint: String,
    token: String,
}

impl HttpGraphQlExecutor<ReqwestTransport> {
    /// Create an executor for the public GitHub endpoint.
    pub fn github(token: &str) -> Result<Self, QueryError> {
        let transport = ReqwestTransport::with_user_agent(concat!(
            "forgepulse/",
            env!("CARGO_PKG_VERSION")
        ))
        .map_err(|e| QueryError::Transport(e.to_string()))?;
        Ok(Self::new(transport, GITHUB_GRAPHQL_URL, token))
    }
}

impl<T: HttpTransport> HttpGraphQlExecutor<T> {
    pub fn new(transport: T, endpoint: impl Into<String>, token: &str) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            token: token.to_string(),
        }
    }

    /// Point the executor at a different endpoint (e.g. GitHub Enterprise).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl<T> fmt::Debug for HttpGraphQlExecutor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGraphQlExecutor")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: HttpTransport> GraphQlExecutor for HttpGraphQlExecutor<T> {
    async fn execute(
        &self,
        request: &GraphQlRequest,
        timeout: Duration,
    ) -> Result<Value, QueryError> {
        if timeout.is_zero() {
            return Err(QueryError::InvalidRequest(
                "timeout must be greater than zero".to_string(),
            ));
        }

        let body = serde_json::to_vec(request).map_err(|e| QueryError::Decode(e.to_string()))?;

        let post = JsonPost {
            url: self.endpoint.clone(),
            bearer: self.token.clone(),
            body,
            timeout,
        };

        let response = self.transport.post_json(post).await.map_err(|e| match e {
            HttpError::Timeout { after } => QueryError::Timeout { after },
            other => QueryError::Transport(other.to_string()),
        })?;

        if !response.is_success() {
            return Err(QueryError::Status {
                status: response.status,
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| QueryError::Decode(e.to_string()))
    }
}

/// Run a request and return its `data` member, containing every failure.
///
/// Timeout and transport failures are logged, surfaced through a
/// [`PulseProgress::Warning`], and resolve to `None`. A response with no
/// `data` (authorization or field errors) also resolves to `None`.
pub async fn fetch_data(
    executor: &dyn GraphQlExecutor,
    request: &GraphQlRequest,
    timeout: Duration,
    on_progress: Option<&ProgressCallback>,
) -> Option<Value> {
    let started = Instant::now();
    let body = match executor.execute(request, timeout).await {
        Ok(body) => body,
        Err(e) => {
            match e.kind() {
                FailureKind::Timeout => {
                    tracing::warn!(timeout_secs = timeout.as_secs(), "GraphQL request timed out")
                }
                _ => tracing::warn!(error = %e, "GraphQL request failed"),
            }
            emit(
                on_progress,
                PulseProgress::Warning {
                    message: short_error_message(&e),
                },
            );
            return None;
        }
    };

    tracing::debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "GraphQL request completed"
    );

    let errors = error_messages(&body);
    if !errors.is_empty() {
        tracing::debug!(errors = ?errors, "GraphQL response carried errors");
    }

    match body.get("data") {
        Some(data) if !data.is_null() => Some(data.clone()),
        _ => {
            tracing::warn!(errors = ?errors, "GraphQL response had no data");
            None
        }
    }
}

/// Collect the `message` of every entry in a response's `errors` array.
pub fn error_messages(body: &Value) -> Vec<String> {
    body.get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
