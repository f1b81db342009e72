use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::types::{ActivityObject, ActivityStream, Actor, Platform, Target, TargetKind};
use crate::validate::validate_outbound;

/// Activity a caller asks an adapter to deliver. Looser than [`ActivityStream`]:
/// generator, published and object ids are filled in by the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutboundActivity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<Actor>,
    pub target: Target,
    /// Platform conversation the message belongs to when `target` names a user,
    /// e.g. the Kik `chatId` of a reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    pub object: OutboundObject,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum OutboundObject {
    #[serde(rename_all = "camelCase")]
    Note {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        in_reply_to: Option<String>,
    },
    Image(OutboundMedia),
    Video(OutboundMedia),
    Document(OutboundMedia),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMedia {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
}

impl OutboundObject {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundObject::Note { .. } => "Note",
            OutboundObject::Image(_) => "Image",
            OutboundObject::Video(_) => "Video",
            OutboundObject::Document(_) => "Document",
        }
    }

    pub fn in_reply_to(&self) -> Option<&str> {
        match self {
            OutboundObject::Note { in_reply_to, .. } => in_reply_to.as_deref(),
            OutboundObject::Image(media)
            | OutboundObject::Video(media)
            | OutboundObject::Document(media) => media.in_reply_to.as_deref(),
        }
    }

    /// Text to send alongside (or instead of) media.
    pub fn text(&self) -> Option<&str> {
        match self {
            OutboundObject::Note { content, .. } => Some(content.as_str()),
            OutboundObject::Image(media)
            | OutboundObject::Video(media)
            | OutboundObject::Document(media) => media.content.as_deref(),
        }
    }
}

impl OutboundActivity {
    /// Schema-checks `value` and converts it into the typed outbound shape.
    ///
    /// ```
    /// use ash_core::{OutboundActivity, OutboundObject};
    /// use serde_json::json;
    ///
    /// let out = OutboundActivity::from_value(&json!({
    ///     "target": { "id": "C42" },
    ///     "object": { "type": "Note", "content": "deploy finished", "inReplyTo": "1700000000.1" }
    /// }))
    /// .unwrap();
    /// assert_eq!(out.target.id, "C42");
    /// assert_eq!(out.object.in_reply_to(), Some("1700000000.1"));
    /// assert!(matches!(out.object, OutboundObject::Note { .. }));
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        validate_outbound(value)?;
        let out: Self = serde_json::from_value(value.clone())
            .map_err(|err| ValidationError::Malformed(err.to_string()))?;
        if matches!(&out.object, OutboundObject::Note { content, .. } if content.trim().is_empty()) {
            return Err(ValidationError::EmptyField("object.content"));
        }
        Ok(out)
    }

    /// Builds the answer to `activity`, carrying its object back to whoever sent it.
    ///
    /// Slack replies go to the channel the message arrived in. On Kik, Messenger and SMS
    /// the inbound target is our own bot, page or number, so the reply is addressed to
    /// the actor instead; Kik keeps the original chat as `conversation`.
    pub fn reply_to(activity: &ActivityStream) -> Self {
        let object = match &activity.object {
            ActivityObject::Note(note) => OutboundObject::Note {
                content: note.content.clone(),
                in_reply_to: note.in_reply_to.clone(),
            },
            ActivityObject::Image(media) => OutboundObject::Image(media.into()),
            ActivityObject::Video(media) => OutboundObject::Video(media.into()),
            ActivityObject::Document(media) => OutboundObject::Document(media.into()),
        };
        let sender = || Target::person(&activity.actor.id);
        let (target, conversation) = match activity.platform() {
            Some(Platform::Slack) => (activity.target.clone(), None),
            Some(Platform::Kik) => (sender(), Some(activity.target.id.clone())),
            Some(Platform::Messenger | Platform::Sms) => (sender(), None),
            None if activity.target.kind == TargetKind::Person => (sender(), None),
            None => (activity.target.clone(), None),
        };
        Self {
            actor: None,
            target,
            conversation,
            object,
        }
    }
}

impl From<&crate::types::Media> for OutboundMedia {
    fn from(media: &crate::types::Media) -> Self {
        Self {
            url: media.url.clone(),
            media_type: Some(media.media_type.clone()),
            name: Some(media.name.clone()),
            content: media.content.clone(),
            in_reply_to: media.in_reply_to.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActivityKind, Generator, Note};
    use crate::ACTIVITY_STREAMS_CONTEXT;
    use serde_json::json;

    fn inbound(generator: Generator, actor: &str, target: Target) -> ActivityStream {
        ActivityStream {
            context: ACTIVITY_STREAMS_CONTEXT.into(),
            kind: ActivityKind::Create,
            generator,
            published: "2023-11-14T22:13:20Z".into(),
            actor: Actor::person(actor),
            target,
            object: ActivityObject::Note(Note {
                id: "m1".into(),
                content: "hello".into(),
                in_reply_to: None,
                context: None,
            }),
        }
    }

    #[test]
    fn media_outbound_parses_optional_fields() {
        let out = OutboundActivity::from_value(&json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "type": "Create",
            "target": { "id": "+15550001111", "type": "Person" },
            "object": {
                "type": "Image",
                "url": "https://cdn.example.com/cat.png",
                "content": "a cat"
            }
        }))
        .unwrap();
        match &out.object {
            OutboundObject::Image(media) => {
                assert_eq!(media.url, "https://cdn.example.com/cat.png");
                assert_eq!(media.media_type, None);
            }
            other => panic!("unexpected object {other:?}"),
        }
        assert_eq!(out.object.text(), Some("a cat"));
    }

    #[test]
    fn missing_target_is_schema_error() {
        let err = OutboundActivity::from_value(&json!({
            "object": { "type": "Note", "content": "hi" }
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::Schema(_)));
    }

    #[test]
    fn unknown_object_type_is_rejected() {
        let err = OutboundActivity::from_value(&json!({
            "target": { "id": "C1" },
            "object": { "type": "Audio", "url": "https://cdn.example.com/a.mp3" }
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::Schema(_)));
    }

    #[test]
    fn whitespace_note_is_empty_field() {
        let err = OutboundActivity::from_value(&json!({
            "target": { "id": "C1" },
            "object": { "type": "Note", "content": " \n\t " }
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyField("object.content"));
    }

    #[test]
    fn blank_media_caption_is_allowed() {
        let out = OutboundActivity::from_value(&json!({
            "target": { "id": "C1" },
            "object": { "type": "Image", "url": "https://cdn.example.com/cat.png", "content": " " }
        }))
        .unwrap();
        assert_eq!(out.object.kind(), "Image");
    }

    #[test]
    fn sms_and_messenger_replies_go_to_the_sender() {
        for (platform, actor, own) in [
            (Platform::Sms, "+15550001111", "+15557770000"),
            (Platform::Messenger, "USER_PSID", "PAGE_ID"),
        ] {
            let activity = inbound(Generator::new(platform, "i-1"), actor, Target::person(own));
            let out = OutboundActivity::reply_to(&activity);
            assert_eq!(out.target, Target::person(actor), "{platform}");
            assert_eq!(out.conversation, None);
            assert_eq!(out.actor, None);
        }
    }

    #[test]
    fn kik_reply_keeps_chat_id() {
        let activity = inbound(Generator::new(Platform::Kik, "kik-1"), "laura", Target::group("chat-9"));
        let out = OutboundActivity::reply_to(&activity);
        assert_eq!(out.target.id, "laura");
        assert_eq!(out.conversation.as_deref(), Some("chat-9"));
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["conversation"], "chat-9");
        assert_eq!(OutboundActivity::from_value(&value).unwrap(), out);
    }

    #[test]
    fn slack_reply_stays_in_channel() {
        for target in [Target::group("C42"), Target::person("D42")] {
            let activity = inbound(Generator::new(Platform::Slack, "slack-1"), "U1", target.clone());
            let out = OutboundActivity::reply_to(&activity);
            assert_eq!(out.target, target);
            assert_eq!(out.object.text(), Some("hello"));
        }
    }

    #[test]
    fn unknown_generator_falls_back_on_target_kind() {
        let mut direct = inbound(Generator::new(Platform::Sms, "x"), "alice", Target::person("bot"));
        direct.generator.name = "irc".into();
        assert_eq!(OutboundActivity::reply_to(&direct).target.id, "alice");

        let mut room = direct.clone();
        room.target = Target::group("#rust");
        assert_eq!(OutboundActivity::reply_to(&room).target.id, "#rust");
    }
}
