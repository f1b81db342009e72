//! Outbound delivery seam between adapters and the network.

use async_trait::async_trait;
use serde_json::Value;

use crate::TransportError;

#[derive(Debug, Clone, PartialEq)]
pub enum Auth {
    None,
    Bearer(String),
    Basic { username: String, password: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// One `POST` to a platform API.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub auth: Auth,
    pub payload: Payload,
}

impl TransportRequest {
    pub fn json(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            auth: Auth::None,
            payload: Payload::Json(body),
        }
    }

    pub fn form(url: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            auth: Auth::None,
            payload: Payload::Form(fields),
        }
    }

    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Successful (2xx) platform answer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Parsed JSON body, `Value::Null` when the body was empty or not JSON.
    pub body: Value,
}

impl TransportResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_defaults() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ash-adapters/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.post(&request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match request.auth {
            Auth::None => builder,
            Auth::Bearer(token) => builder.bearer_auth(token),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
        };
        builder = match &request.payload {
            Payload::Json(body) => builder.json(body),
            Payload::Form(fields) => builder.form(fields),
        };

        let response = builder
            .send()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;
        let status = response.status();
        let retry_after_ms = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(|seconds| seconds * 1_000);
        let body_text = response
            .text()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), url = %request.url, "platform rejected request");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: body_text,
                retry_after_ms,
            });
        }

        let body = serde_json::from_str(&body_text).unwrap_or(Value::Null);
        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(any(test, feature = "testkit"))]
mod recording {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::{Transport, TransportRequest, TransportResponse};
    use crate::TransportError;

    /// Records every request and answers from a scripted queue (`200 {}` once it runs dry).
    #[derive(Debug, Default)]
    pub struct RecordingTransport {
        requests: Mutex<Vec<TransportRequest>>,
        responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond_with(&self, response: Result<TransportResponse, TransportError>) {
            self.responses
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push_back(response);
        }

        pub fn requests(&self) -> Vec<TransportRequest> {
            self.requests
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn deliver(
            &self,
            request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.requests
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(request);
            self.responses
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .pop_front()
                .unwrap_or_else(|| Ok(TransportResponse::ok(Value::Object(Default::default()))))
        }
    }
}

#[cfg(any(test, feature = "testkit"))]
pub use recording::RecordingTransport;
