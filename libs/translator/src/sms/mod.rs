//! Twilio Programmable Messaging (SMS/MMS) webhooks and `Messages.json` form bodies.

mod inbound;
mod outbound;

pub use inbound::{MAX_MEDIA, SmsMessage, SmsParser};
pub use outbound::{MAX_BODY_CHARS, SmsTranslator, to_sms_payloads};
