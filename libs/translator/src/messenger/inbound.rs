use ash_core::clock::from_unix_millis;
use ash_core::{
    ActivityBuilder, ActivityStream, Actor, Attachment, Callback, MediaKind, ParseError, Parser,
    ParserContext, Platform, Target, UserInfo,
};
use serde::Serialize;
use serde_json::Value;

use crate::json::{ensure_object, millis_at, str_at, str_ptr};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MessengerMessage {
    pub mid: String,
    pub sender: String,
    pub recipient: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
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
pub struct MessengerParser {
    ctx: ParserContext,
}

impl MessengerParser {
    pub fn new(ctx: ParserContext) -> Self {
        Self { ctx }
    }
}

/// Maps the first usable attachment; stickers, locations and templates carry no media url.
fn attachment(message: &Value) -> Option<Attachment> {
    message
        .get("attachments")
        .and_then(Value::as_array)?
        .iter()
        .find_map(|item| {
            let url = str_ptr(item, "/payload/url")?;
            let (kind, mime) = match str_at(item, "type")? {
                "image" => (MediaKind::Image, "image/jpeg"),
                "video" => (MediaKind::Video, "video/mp4"),
                "audio" => (MediaKind::Document, "audio/mpeg"),
                "file" => (MediaKind::Document, "application/octet-stream"),
                _ => return None,
            };
            Some(
                Attachment::new(url)
                    .with_kind(kind)
                    .with_media_type(Some(mime.to_string())),
            )
        })
}

impl Parser for MessengerParser {
    type Normalized = MessengerMessage;

    fn platform(&self) -> Platform {
        Platform::Messenger
    }

    fn context(&self) -> &ParserContext {
        &self.ctx
    }

    fn events(&self, raw: &Value) -> Vec<Value> {
        match raw.get("entry").and_then(Value::as_array) {
            Some(entries) => entries
                .iter()
                .filter_map(|entry| entry.get("messaging").and_then(Value::as_array))
                .flatten()
                .cloned()
                .collect(),
            None => vec![raw.clone()],
        }
    }

    fn normalize(
        &self,
        raw: &Value,
        user: Option<&UserInfo>,
    ) -> Result<Option<MessengerMessage>, ParseError> {
        ensure_object(raw)?;
        let message = raw.get("message").filter(|m| m.is_object());
        let postback = raw.get("postback").filter(|p| p.is_object());
        if message.is_none() && postback.is_none() {
            // delivery, read, optin and referral events
            return Ok(None);
        }
        if message
            .and_then(|m| m.get("is_echo"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            return Ok(None);
        }

        let sender = str_ptr(raw, "/sender/id").ok_or(ParseError::MissingField("sender"))?;
        let recipient =
            str_ptr(raw, "/recipient/id").ok_or(ParseError::MissingField("recipient"))?;
        let timestamp = millis_at(raw, "timestamp");

        let text = message
            .and_then(|m| m.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let attachment = message.and_then(attachment);
        let callback = if let Some(postback) = postback {
            Some(Callback {
                id: str_at(postback, "payload")
                    .ok_or(ParseError::MissingField("postback.payload"))?
                    .to_string(),
                value: str_at(postback, "payload").map(str::to_string),
                name: str_at(postback, "title").map(str::to_string),
            })
        } else {
            message
                .and_then(|m| str_ptr(m, "/quick_reply/payload"))
                .map(|payload| Callback {
                    id: payload.to_string(),
                    value: Some(payload.to_string()),
                    name: text.clone(),
                })
        };

        let has_text = text.as_deref().is_some_and(|t| !t.trim().is_empty());
        if !has_text && attachment.is_none() && callback.is_none() {
            tracing::debug!("messenger message without usable content");
            return Ok(None);
        }

        let mid = message
            .and_then(|m| str_at(m, "mid"))
            .or_else(|| postback.and_then(|p| str_at(p, "mid")))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{sender}:{}", timestamp.unwrap_or_default()));

        Ok(Some(MessengerMessage {
            mid,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            text,
            attachment,
            callback,
            timestamp,
            user_info: user.cloned(),
        }))
    }

    fn parse(&self, msg: &MessengerMessage) -> Result<ActivityStream, ParseError> {
        ActivityBuilder::new(
            &self.ctx,
            &msg.mid,
            Actor::from_user(&msg.sender, msg.user_info.as_ref()),
            Target::person(&msg.recipient),
        )
        .text(msg.text.as_deref())
        .attachment(msg.attachment.clone())
        .callback(msg.callback.clone())
        .published(msg.timestamp.and_then(from_unix_millis))
        .build()
    }
}
