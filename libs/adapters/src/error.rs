use ash_core::{ParseError, Platform, ValidationError};
use ash_security::SignatureError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{0} adapter is not running")]
    NotRunning(Platform),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("outbound activity rejected: {0}")]
    Invalid(#[from] ValidationError),
    #[error("cannot build platform payload: {0:#}")]
    Translate(anyhow::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("request failed verification: {0}")]
    Unauthorized(#[from] SignatureError),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Delivery failure reported by a [`Transport`](crate::Transport) or by the platform API.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("platform answered {status}: {body}")]
    Status {
        status: u16,
        body: String,
        retry_after_ms: Option<u64>,
    },
    #[error("platform api error `{code}`")]
    Api { code: String },
    #[error("unreadable platform response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// Throttling, server errors and network failures may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Network(_) => true,
            TransportError::Status { status, .. } => *status == 429 || *status >= 500,
            TransportError::Api { code } => code == "ratelimited",
            TransportError::InvalidResponse(_) => false,
        }
    }

    pub fn backoff_ms(&self) -> Option<u64> {
        match self {
            TransportError::Status { retry_after_ms, .. } if self.is_retryable() => {
                retry_after_ms.or(Some(1_000))
            }
            TransportError::Network(_) => Some(1_000),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_classification() {
        let throttled = TransportError::Status {
            status: 429,
            body: String::new(),
            retry_after_ms: Some(30_000),
        };
        assert!(throttled.is_retryable());
        assert_eq!(throttled.backoff_ms(), Some(30_000));

        let bad_request = TransportError::Status {
            status: 400,
            body: "bad".into(),
            retry_after_ms: None,
        };
        assert!(!bad_request.is_retryable());
        assert_eq!(bad_request.backoff_ms(), None);

        let server = TransportError::Status {
            status: 503,
            body: String::new(),
            retry_after_ms: None,
        };
        assert_eq!(server.backoff_ms(), Some(1_000));
    }
}
