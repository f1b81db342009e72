//! Slack Events API and interactivity payloads.

mod inbound;
mod outbound;

pub use inbound::{SlackMessage, SlackParser, url_verification_challenge};
pub use outbound::{SlackTranslator, to_slack_payloads};
