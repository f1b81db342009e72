//! Builds Twilio `Messages.json` form fields (as a flat JSON object of strings).

use anyhow::{Result, bail};
use ash_core::{OutboundActivity, OutboundObject, Platform};
use serde_json::{Map, Value, json};

use crate::telemetry::translate_with_span;
use crate::{Translator, grapheme_len};

/// Twilio rejects bodies longer than this.
pub const MAX_BODY_CHARS: usize = 1_600;

pub struct SmsTranslator {
    from: String,
}

impl SmsTranslator {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

impl Translator for SmsTranslator {
    fn to_platform(&self, out: &OutboundActivity) -> Result<Vec<Value>> {
        to_sms_payloads(out, &self.from)
    }
}

pub fn to_sms_payloads(out: &OutboundActivity, from: &str) -> Result<Vec<Value>> {
    translate_with_span(Platform::Sms, &out.target.id, || {
        let mut form = Map::new();
        form.insert("To".into(), json!(out.target.id));
        form.insert("From".into(), json!(from));

        let body = out.object.text().unwrap_or_default();
        let len = grapheme_len(body);
        if len > MAX_BODY_CHARS {
            bail!("sms body has {len} characters, limit is {MAX_BODY_CHARS}");
        }
        if !body.is_empty() {
            form.insert("Body".into(), json!(body));
        }
        match &out.object {
            OutboundObject::Note { .. } => {}
            OutboundObject::Image(media)
            | OutboundObject::Video(media)
            | OutboundObject::Document(media) => {
                form.insert("MediaUrl".into(), json!(media.url));
            }
        }
        Ok(vec![Value::Object(form)])
    })
}
