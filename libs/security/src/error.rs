use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing `{0}` header")]
    MissingHeader(&'static str),
    #[error("signature is not well formed")]
    Malformed,
    #[error("signature does not match the payload")]
    Mismatch,
    #[error("request timestamp is outside the replay window")]
    Stale,
    #[error("signing secret is empty or unusable")]
    InvalidKey,
    #[error("subscription verification failed")]
    Subscription,
    #[error("webhook addressed to `{0}`")]
    WrongRecipient(String),
}
