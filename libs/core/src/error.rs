use thiserror::Error;

/// Failures raised while turning a raw platform payload into an activity.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` has an unexpected value: {detail}")]
    InvalidField { field: &'static str, detail: String },
    #[error("message carries neither text nor media")]
    Empty,
    #[error("unknown platform `{0}`")]
    UnknownPlatform(String),
}

impl ParseError {
    pub fn invalid(field: &'static str, detail: impl Into<String>) -> Self {
        ParseError::InvalidField {
            field,
            detail: detail.into(),
        }
    }
}

/// Reasons an activity fails structural or schema validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("field `{0}` is empty")]
    EmptyField(&'static str),
    #[error("unexpected @context `{0}`")]
    WrongContext(String),
    #[error("invalid published timestamp `{0}`")]
    InvalidPublished(String),
    #[error("`{field}` is not an absolute http(s) url: {url}")]
    InvalidUrl { field: &'static str, url: String },
    #[error("schema violation: {0}")]
    Schema(String),
    #[error("payload does not describe an outbound activity: {0}")]
    Malformed(String),
}
