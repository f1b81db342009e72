//! Kik bot messages (`/v1/message` and webhook deliveries).

mod inbound;
mod outbound;

pub use inbound::{KikMessage, KikParser};
pub use outbound::{KikTranslator, to_kik_payloads};
