//! Builds Send API (`/me/messages`) bodies.

use anyhow::Result;
use ash_core::{OutboundActivity, OutboundMedia, OutboundObject, Platform};
use serde_json::{Value, json};

use crate::telemetry::translate_with_span;
use crate::{Translator, split_graphemes};

/// Send API limit for `message.text`.
const MAX_TEXT_CHARS: usize = 2_000;

pub struct MessengerTranslator;

impl Translator for MessengerTranslator {
    fn to_platform(&self, out: &OutboundActivity) -> Result<Vec<Value>> {
        to_messenger_payloads(out)
    }
}

pub fn to_messenger_payloads(out: &OutboundActivity) -> Result<Vec<Value>> {
    translate_with_span(Platform::Messenger, &out.target.id, || {
        let recipient = out.target.id.as_str();
        let mut payloads = Vec::new();
        match &out.object {
            OutboundObject::Note { content, .. } => {
                for chunk in split_graphemes(content, MAX_TEXT_CHARS) {
                    payloads.push(envelope(recipient, json!({ "text": chunk })));
                }
            }
            OutboundObject::Image(media) => push_media(&mut payloads, recipient, "image", media),
            OutboundObject::Video(media) => push_media(&mut payloads, recipient, "video", media),
            OutboundObject::Document(media) => {
                let kind = match media.media_type.as_deref() {
                    Some(mime) if mime.starts_with("audio/") => "audio",
                    _ => "file",
                };
                push_media(&mut payloads, recipient, kind, media)
            }
        }
        Ok(payloads)
    })
}

fn envelope(recipient: &str, message: Value) -> Value {
    json!({
        "recipient": { "id": recipient },
        "messaging_type": "RESPONSE",
        "message": message,
    })
}

fn push_media(payloads: &mut Vec<Value>, recipient: &str, kind: &str, media: &OutboundMedia) {
    if let Some(caption) = media.content.as_deref().filter(|c| !c.trim().is_empty()) {
        for chunk in split_graphemes(caption, MAX_TEXT_CHARS) {
            payloads.push(envelope(recipient, json!({ "text": chunk })));
        }
    }
    payloads.push(envelope(
        recipient,
        json!({
            "attachment": {
                "type": kind,
                "payload": { "url": media.url, "is_reusable": true }
            }
        }),
    ));
}
