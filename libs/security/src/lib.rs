//! Request authenticity checks for inbound platform webhooks.
//!
//! Nothing here touches HTTP types: callers hand over header values and the raw body bytes,
//! which keeps the helpers usable from any server framework.

mod error;
pub mod kik;
pub mod messenger;
pub mod slack;
pub mod twilio;

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub use error::SignatureError;
pub use kik::verify_kik_username;
pub use messenger::{verify_messenger, verify_messenger_subscription};
pub use slack::{SLACK_REPLAY_WINDOW_SECS, verify_slack, verify_slack_at};
pub use twilio::{twilio_signature, verify_twilio};

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

pub(crate) fn hmac_sha256(secret: &str, parts: &[&[u8]]) -> Result<Vec<u8>, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

pub(crate) fn hmac_sha1(secret: &str, parts: &[&[u8]]) -> Result<Vec<u8>, SignatureError> {
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

pub(crate) fn constant_time_eq(expected: &[u8], provided: &[u8]) -> bool {
    expected.len() == provided.len() && bool::from(expected.ct_eq(provided))
}
