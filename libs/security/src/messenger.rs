//! Messenger Platform webhooks: `X-Hub-Signature-256` and the `hub.challenge` handshake.

use crate::{SignatureError, constant_time_eq, hmac_sha256};

/// Verifies `X-Hub-Signature-256: sha256=<hex>` against the app secret.
pub fn verify_messenger(
    app_secret: &str,
    signature: Option<&str>,
    body: &[u8],
) -> Result<(), SignatureError> {
    if app_secret.is_empty() {
        return Err(SignatureError::InvalidKey);
    }
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::MissingHeader("X-Hub-Signature-256"))?;
    let provided = signature
        .strip_prefix("sha256=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
        .ok_or(SignatureError::Malformed)?;
    let expected = hmac_sha256(app_secret, &[body])?;
    if constant_time_eq(&expected, &provided) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Checks a `GET` subscription request and returns the challenge to echo back.
///
/// ```
/// use ash_security::verify_messenger_subscription;
///
/// let challenge = verify_messenger_subscription(
///     "my-token",
///     Some("subscribe"),
///     Some("my-token"),
///     Some("1158201444"),
/// );
/// assert_eq!(challenge, Ok("1158201444"));
/// ```
pub fn verify_messenger_subscription<'a>(
    verify_token: &str,
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&'a str>,
) -> Result<&'a str, SignatureError> {
    let token_ok = token
        .map(|t| constant_time_eq(verify_token.as_bytes(), t.as_bytes()))
        .unwrap_or(false);
    match (mode, challenge) {
        (Some("subscribe"), Some(challenge)) if token_ok && !verify_token.is_empty() => {
            Ok(challenge)
        }
        _ => Err(SignatureError::Subscription),
    }
}
