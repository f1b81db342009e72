//! Builds `/v1/message` bodies. Kik addresses recipients by username, so the
//! outbound target id is the username to send to. An outbound `conversation`
//! becomes the `chatId` of every message, which is how replies land in group chats.

use anyhow::Result;
use ash_core::{OutboundActivity, OutboundObject, Platform};
use serde_json::{Value, json};

use crate::telemetry::translate_with_span;
use crate::{Translator, split_graphemes};

/// Kik rejects text bodies longer than this.
const MAX_BODY_CHARS: usize = 2_000;
/// Kik accepts at most this many messages per request.
const MAX_MESSAGES_PER_REQUEST: usize = 25;

pub struct KikTranslator;

impl Translator for KikTranslator {
    fn to_platform(&self, out: &OutboundActivity) -> Result<Vec<Value>> {
        to_kik_payloads(out)
    }
}

pub fn to_kik_payloads(out: &OutboundActivity) -> Result<Vec<Value>> {
    translate_with_span(Platform::Kik, &out.target.id, || {
        let to = out.target.id.as_str();
        let mut messages = Vec::new();
        match &out.object {
            OutboundObject::Note { content, .. } => {
                for chunk in split_graphemes(content, MAX_BODY_CHARS) {
                    messages.push(json!({ "type": "text", "to": to, "body": chunk }));
                }
            }
            OutboundObject::Image(media) => {
                push_caption(&mut messages, to, media.content.as_deref());
                messages.push(json!({ "type": "picture", "to": to, "picUrl": media.url }));
            }
            OutboundObject::Video(media) => {
                push_caption(&mut messages, to, media.content.as_deref());
                messages.push(json!({ "type": "video", "to": to, "videoUrl": media.url }));
            }
            OutboundObject::Document(media) => {
                let mut link = json!({ "type": "link", "to": to, "url": media.url });
                if let Some(name) = media.name.as_deref() {
                    link["title"] = json!(name);
                }
                if let Some(caption) = media.content.as_deref().filter(|c| !c.trim().is_empty()) {
                    link["text"] = json!(caption);
                }
                messages.push(link);
            }
        }
        if let Some(chat_id) = out.conversation.as_deref() {
            for message in &mut messages {
                message["chatId"] = json!(chat_id);
            }
        }
        Ok(messages
            .chunks(MAX_MESSAGES_PER_REQUEST)
            .map(|chunk| json!({ "messages": chunk }))
            .collect())
    })
}

fn push_caption(messages: &mut Vec<Value>, to: &str, caption: Option<&str>) {
    if let Some(caption) = caption.filter(|c| !c.trim().is_empty()) {
        messages.push(json!({ "type": "text", "to": to, "body": caption }));
    }
}
