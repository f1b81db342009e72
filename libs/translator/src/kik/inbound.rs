use ash_core::clock::from_unix_millis;
use ash_core::{
    ActivityBuilder, ActivityStream, Actor, Attachment, Callback, MediaKind, ParseError, Parser,
    ParserContext, Platform, Target, UserInfo,
};
use serde::Serialize;
use serde_json::Value;

use crate::json::{ensure_object, millis_at, required, str_at};

/// Kik message types that never carry user content.
const IGNORED_TYPES: &[&str] = &[
    "is-typing",
    "delivery-receipt",
    "read-receipt",
    "start-chatting",
    "friend-picker",
    "scan-data",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KikMessage {
    pub id: String,
    pub kind: String,
    pub from: String,
    pub chat_id: String,
    pub participants: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<Callback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
}

#[derive(Debug, Clone)]
pub struct KikParser {
    ctx: ParserContext,
}

impl KikParser {
    pub fn new(ctx: ParserContext) -> Self {
        Self { ctx }
    }
}

/// Suggested-response replies carry the keyboard metadata back.
fn metadata_callback(raw: &Value, body: Option<&str>) -> Option<Callback> {
    let metadata = raw.get("metadata").filter(|m| !m.is_null())?;
    let id = match metadata {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Some(Callback {
        id,
        value: body.map(str::to_string),
        name: None,
    })
}

impl Parser for KikParser {
    type Normalized = KikMessage;

    fn platform(&self) -> Platform {
        Platform::Kik
    }

    fn context(&self) -> &ParserContext {
        &self.ctx
    }

    fn events(&self, raw: &Value) -> Vec<Value> {
        match raw.get("messages").and_then(Value::as_array) {
            Some(messages) => messages.clone(),
            None => vec![raw.clone()],
        }
    }

    fn normalize(
        &self,
        raw: &Value,
        user: Option<&UserInfo>,
    ) -> Result<Option<KikMessage>, ParseError> {
        ensure_object(raw)?;
        let kind = required(raw, "type")?;
        if IGNORED_TYPES.contains(&kind) {
            return Ok(None);
        }

        let (body, attachment, callback) = match kind {
            "text" => {
                let body = raw.get("body").and_then(Value::as_str);
                (body.map(str::to_string), None, metadata_callback(raw, body))
            }
            "picture" => {
                let url = required(raw, "picUrl")?;
                (None, Some(Attachment::new(url).with_kind(MediaKind::Image)), None)
            }
            "video" => {
                let url = required(raw, "videoUrl")?;
                (None, Some(Attachment::new(url).with_kind(MediaKind::Video)), None)
            }
            "link" => {
                let url = required(raw, "url")?;
                let attachment = Attachment::new(url)
                    .with_kind(MediaKind::Document)
                    .with_media_type(Some("text/html".into()))
                    .with_name(str_at(raw, "title").map(str::to_string))
                    .with_preview(str_at(raw, "picUrl").map(str::to_string));
                (str_at(raw, "text").map(str::to_string), Some(attachment), None)
            }
            other => {
                tracing::debug!(kik_type = other, "unsupported kik message type");
                return Ok(None);
            }
        };

        let participants = raw
            .get("participants")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(1);

        Ok(Some(KikMessage {
            id: required(raw, "id")?.to_string(),
            kind: kind.to_string(),
            from: required(raw, "from")?.to_string(),
            chat_id: required(raw, "chatId")?.to_string(),
            participants,
            body,
            attachment,
            callback,
            timestamp: millis_at(raw, "timestamp"),
            user_info: user.cloned(),
        }))
    }

    fn parse(&self, msg: &KikMessage) -> Result<ActivityStream, ParseError> {
        let target = if msg.participants > 1 {
            Target::group(&msg.chat_id)
        } else {
            Target::person(&msg.chat_id)
        };
        ActivityBuilder::new(
            &self.ctx,
            &msg.id,
            Actor::from_user(&msg.from, msg.user_info.as_ref()),
            target,
        )
        .text(msg.body.as_deref())
        .attachment(msg.attachment.clone())
        .callback(msg.callback.clone())
        .published(msg.timestamp.and_then(from_unix_millis))
        .build()
    }
}
