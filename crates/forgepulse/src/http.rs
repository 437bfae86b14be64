//! HTTP boundary of the GraphQL executor.
//!
//! GraphQL only ever needs one kind of exchange: an authenticated JSON POST
//! with a time bound. [`HttpTransport`] models exactly that, so the executor
//! can be driven by [`ReqwestTransport`] in production and by a scripted
//! transport in unit tests.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// An authenticated JSON POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPost {
    pub url: String,
    /// Sent as `Authorization: Bearer <token>`.
    pub bearer: String,
    pub body: Vec<u8>,
    /// Bound on the whole exchange, connect to last body byte.
    pub timeout: Duration,
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("no response within {after:?}")]
    Timeout { after: Duration },

    #[error("connection failed: {0}")]
    Transport(String),

    #[error("mock transport has no scripted response left")]
    NoMockResponse,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, request: JsonPost) -> Result<RawResponse, HttpError>;
}

/// [`HttpTransport`] backed by a shared reqwest client.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self, HttpError> {
        reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map(Self::new)
            .map_err(|e| HttpError::Transport(e.to_string()))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, request: JsonPost) -> Result<RawResponse, HttpError> {
        let after = request.timeout;
        let lift = |e: reqwest::Error| {
            if e.is_timeout() {
                HttpError::Timeout { after }
            } else {
                HttpError::Transport(e.to_string())
            }
        };

        let response = self
            .client
            .post(&request.url)
            .bearer_auth(&request.bearer)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(after)
            .body(request.body)
            .send()
            .await
            .map_err(lift)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(lift)?.to_vec();
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
pub use mock::MockTransport;

#[cfg(test)]
mod mock {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Default)]
    struct Script {
        replies: VecDeque<Result<RawResponse, Duration>>,
        sent: Vec<JsonPost>,
    }

    /// Replays scripted replies in order and records every request.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        script: Arc<Mutex<Script>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        fn script(&self) -> std::sync::MutexGuard<'_, Script> {
            self.script.lock().unwrap_or_else(|e| e.into_inner())
        }

        pub fn reply(&self, status: u16, body: impl Into<Vec<u8>>) {
            self.script().replies.push_back(Ok(RawResponse {
                status,
                body: body.into(),
            }));
        }

        pub fn time_out(&self, after: Duration) {
            self.script().replies.push_back(Err(after));
        }

        pub fn sent(&self) -> Vec<JsonPost> {
            self.script().sent.clone()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn post_json(&self, request: JsonPost) -> Result<RawResponse, HttpError> {
            let mut script = self.script();
            script.sent.push(request);
            match script.replies.pop_front() {
                Some(Ok(response)) => Ok(response),
                Some(Err(after)) => Err(HttpError::Timeout { after }),
                None => Err(HttpError::NoMockResponse),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> JsonPost {
        JsonPost {
            url: "https://example.test/graphql".to_string(),
            bearer: "t0ken".to_string(),
            body: b"{}".to_vec(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_success_range() {
        let mut response = RawResponse {
            status: 200,
            body: Vec::new(),
        };
        assert!(response.is_success());
        response.status = 299;
        assert!(response.is_success());
        response.status = 401;
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_mock_replays_in_order_then_runs_dry() {
        let transport = MockTransport::new();
        transport.reply(200, "{}");
        transport.time_out(Duration::from_secs(3));

        let first = transport.post_json(post()).await.expect("scripted reply");
        assert_eq!(first.body, b"{}".to_vec());

        let second = transport.post_json(post()).await.expect_err("scripted timeout");
        assert!(matches!(second, HttpError::Timeout { after } if after == Duration::from_secs(3)));

        let third = transport.post_json(post()).await.expect_err("script exhausted");
        assert!(matches!(third, HttpError::NoMockResponse));

        assert_eq!(transport.sent().len(), 3);
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::with_user_agent("forgepulse-test").is_ok());
    }
}
