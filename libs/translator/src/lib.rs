//! Platform parsers and payload builders for the activity hub.
//!
//! Inbound, each platform module exposes a [`ash_core::Parser`] implementation that turns
//! webhook payloads into validated activities. Outbound, the [`Translator`] trait turns an
//! [`OutboundActivity`](ash_core::OutboundActivity) into one or more platform request bodies.

use anyhow::Result;
use ash_core::OutboundActivity;
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

mod json;
pub mod kik;
pub mod messenger;
pub mod slack;
pub mod sms;
pub mod telemetry;

pub use kik::{KikMessage, KikParser, KikTranslator};
pub use messenger::{MessengerMessage, MessengerParser, MessengerTranslator};
pub use slack::{SlackMessage, SlackParser, SlackTranslator};
pub use sms::{SmsMessage, SmsParser, SmsTranslator};

/// Converts an [`OutboundActivity`] into a list of platform specific payloads.
///
/// Implementations never mutate the activity and return an error when the platform cannot
/// carry the requested object.
pub trait Translator {
    fn to_platform(&self, out: &OutboundActivity) -> Result<Vec<Value>>;
}

/// Splits `text` into chunks of at most `max` grapheme clusters, never cutting a cluster.
///
/// ```
/// use ash_translator::split_graphemes;
///
/// assert_eq!(split_graphemes("abcde", 2), vec!["ab", "cd", "e"]);
/// assert_eq!(split_graphemes("", 3), vec![""]);
/// ```
pub fn split_graphemes(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for grapheme in text.graphemes(true) {
        if count == max {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push_str(grapheme);
        count += 1;
    }
    chunks.push(current);
    chunks
}

/// Number of grapheme clusters in `text`.
pub fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}
