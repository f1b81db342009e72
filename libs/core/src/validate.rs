use jsonschema::{Validator, validator_for};
use once_cell::sync::Lazy;
use serde_json::Value;
use url::Url;

use crate::clock::parse_published;
use crate::error::ValidationError;
use crate::types::{ACTIVITY_STREAMS_CONTEXT, ActivityObject, ActivityStream};

static ACTIVITY_SCHEMA: Lazy<Validator> = Lazy::new(|| {
    let schema: Value = serde_json::from_str(include_str!("../schemas/activity.schema.json"))
        .expect("embedded activity schema is valid json");
    validator_for(&schema).expect("embedded activity schema compiles")
});

static OUTBOUND_SCHEMA: Lazy<Validator> = Lazy::new(|| {
    let schema: Value = serde_json::from_str(include_str!("../schemas/outbound.schema.json"))
        .expect("embedded outbound schema is valid json");
    validator_for(&schema).expect("embedded outbound schema compiles")
});

/// Validates an emitted [`ActivityStream`]: structural rules first, then the JSON schema.
///
/// ```
/// use ash_core::{
///     validate_activity, ActivityKind, ActivityObject, ActivityStream, Actor, Generator, Note,
///     Platform, Target, ACTIVITY_STREAMS_CONTEXT,
/// };
///
/// let mut activity = ActivityStream {
///     context: ACTIVITY_STREAMS_CONTEXT.into(),
///     kind: ActivityKind::Create,
///     generator: Generator::new(Platform::Kik, "kik-1"),
///     published: "2024-01-01T00:00:00Z".into(),
///     actor: Actor::person("alice"),
///     target: Target::group("chat-1"),
///     object: ActivityObject::Note(Note {
///         id: "m1".into(),
///         content: "hello".into(),
///         in_reply_to: None,
///         context: None,
///     }),
/// };
/// validate_activity(&activity).unwrap();
///
/// activity.target.id.clear();
/// assert!(validate_activity(&activity).is_err());
/// ```
pub fn validate_activity(activity: &ActivityStream) -> Result<(), ValidationError> {
    if activity.context != ACTIVITY_STREAMS_CONTEXT {
        return Err(ValidationError::WrongContext(activity.context.clone()));
    }
    non_empty(&activity.generator.id, "generator.id")?;
    non_empty(&activity.generator.name, "generator.name")?;
    non_empty(&activity.actor.id, "actor.id")?;
    non_empty(&activity.target.id, "target.id")?;
    non_empty(activity.object.id(), "object.id")?;
    if parse_published(&activity.published).is_none() {
        return Err(ValidationError::InvalidPublished(activity.published.clone()));
    }

    match &activity.object {
        ActivityObject::Note(note) => non_empty(&note.content, "object.content")?,
        ActivityObject::Image(media)
        | ActivityObject::Video(media)
        | ActivityObject::Document(media) => {
            http_url(&media.url, "object.url")?;
            non_empty(&media.media_type, "object.mediaType")?;
            if let Some(preview) = &media.preview {
                http_url(preview.href(), "object.preview.href")?;
            }
        }
    }

    let value = serde_json::to_value(activity)
        .map_err(|err| ValidationError::Malformed(err.to_string()))?;
    check_schema(&ACTIVITY_SCHEMA, &value)
}

/// Validates a loosely-typed outbound activity before any platform payload is built.
///
/// ```
/// use ash_core::validate_outbound;
/// use serde_json::json;
///
/// let ok = json!({
///     "target": { "id": "C1" },
///     "object": { "type": "Note", "content": "hi" }
/// });
/// validate_outbound(&ok).unwrap();
///
/// let bad = json!({ "target": { "id": "C1" }, "object": { "type": "Image" } });
/// assert!(validate_outbound(&bad).is_err());
/// ```
pub fn validate_outbound(value: &Value) -> Result<(), ValidationError> {
    check_schema(&OUTBOUND_SCHEMA, value)
}

fn check_schema(validator: &Validator, value: &Value) -> Result<(), ValidationError> {
    let messages: Vec<String> = validator
        .iter_errors(value)
        .map(|err| err.to_string())
        .collect();
    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Schema(messages.join("; ")))
    }
}

fn non_empty(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

fn http_url(value: &str, field: &'static str) -> Result<(), ValidationError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(ValidationError::InvalidUrl {
            field,
            url: value.to_string(),
        }),
    }
}
