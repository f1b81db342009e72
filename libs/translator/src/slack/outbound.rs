//! Builds `chat.postMessage` bodies from outbound activities.

use anyhow::Result;
use ash_core::{OutboundActivity, OutboundMedia, OutboundObject, Platform};
use serde_json::{Value, json};

use crate::telemetry::translate_with_span;
use crate::{Translator, split_graphemes};

/// Slack truncates `text` beyond this; longer notes are split across messages.
const MAX_TEXT_CHARS: usize = 4_000;

pub struct SlackTranslator;

impl Translator for SlackTranslator {
    fn to_platform(&self, out: &OutboundActivity) -> Result<Vec<Value>> {
        to_slack_payloads(out)
    }
}

pub fn to_slack_payloads(out: &OutboundActivity) -> Result<Vec<Value>> {
    translate_with_span(Platform::Slack, &out.target.id, || {
        let channel = out.target.id.as_str();
        let thread_ts = out.object.in_reply_to();
        let payloads = match &out.object {
            OutboundObject::Note { content, .. } => split_graphemes(content, MAX_TEXT_CHARS)
                .into_iter()
                .map(|chunk| message(channel, &chunk, None, thread_ts))
                .collect(),
            OutboundObject::Image(media) => {
                let alt = media_label(media);
                let mut blocks = caption_blocks(media);
                blocks.push(json!({
                    "type": "image",
                    "image_url": media.url,
                    "alt_text": alt,
                }));
                vec![message(channel, &fallback_text(media), Some(blocks), thread_ts)]
            }
            OutboundObject::Video(media) | OutboundObject::Document(media) => {
                let mut blocks = caption_blocks(media);
                blocks.push(section_md(&format!("<{}|{}>", media.url, media_label(media))));
                vec![message(channel, &fallback_text(media), Some(blocks), thread_ts)]
            }
        };
        Ok(payloads)
    })
}

fn message(channel: &str, text: &str, blocks: Option<Vec<Value>>, thread_ts: Option<&str>) -> Value {
    let mut payload = serde_json::Map::new();
    payload.insert("channel".into(), json!(channel));
    payload.insert("text".into(), json!(text));
    if let Some(blocks) = blocks {
        payload.insert("blocks".into(), Value::Array(blocks));
    }
    if let Some(ts) = thread_ts {
        payload.insert("thread_ts".into(), json!(ts));
    }
    Value::Object(payload)
}

fn section_md(text: &str) -> Value {
    json!({
      "type": "section",
      "text": { "type": "mrkdwn", "text": text }
    })
}

fn caption_blocks(media: &OutboundMedia) -> Vec<Value> {
    media
        .content
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(|c| vec![section_md(c)])
        .unwrap_or_default()
}

fn media_label(media: &OutboundMedia) -> String {
    media
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| media.url.clone())
}

/// Notification text shown where blocks are not rendered.
fn fallback_text(media: &OutboundMedia) -> String {
    match media.content.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(caption) => caption.to_string(),
        None => media_label(media),
    }
}
