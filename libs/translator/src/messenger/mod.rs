//! Facebook Messenger Platform webhooks and Send API bodies.

mod inbound;
mod outbound;

pub use inbound::{MessengerMessage, MessengerParser};
pub use outbound::{MessengerTranslator, to_messenger_payloads};
