//! Slack signed requests (`X-Slack-Signature`, `X-Slack-Request-Timestamp`).

use time::OffsetDateTime;

use crate::{SignatureError, constant_time_eq, hmac_sha256};

/// Requests older (or newer) than this are treated as replays.
pub const SLACK_REPLAY_WINDOW_SECS: i64 = 60 * 5;

/// Verifies a Slack request against the signing secret using the system clock.
pub fn verify_slack(
    secret: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
) -> Result<(), SignatureError> {
    verify_slack_at(secret, timestamp, signature, body, OffsetDateTime::now_utc())
}

/// Same as [`verify_slack`] with an explicit "now".
///
/// ```
/// use ash_security::{SignatureError, verify_slack_at};
/// use time::OffsetDateTime;
///
/// let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
/// let err = verify_slack_at("secret", Some("1700000000"), Some("v0=deadbeef"), b"{}", now);
/// assert_eq!(err, Err(SignatureError::Mismatch));
/// ```
pub fn verify_slack_at(
    secret: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
    now: OffsetDateTime,
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::InvalidKey);
    }
    let timestamp = timestamp
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(SignatureError::MissingHeader("X-Slack-Request-Timestamp"))?;
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::MissingHeader("X-Slack-Signature"))?;

    let sent: i64 = timestamp.parse().map_err(|_| SignatureError::Malformed)?;
    if (now.unix_timestamp() - sent).abs() > SLACK_REPLAY_WINDOW_SECS {
        tracing::warn!(sent, "slack request outside replay window");
        return Err(SignatureError::Stale);
    }

    let provided = signature
        .strip_prefix("v0=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
        .ok_or(SignatureError::Malformed)?;
    let expected = hmac_sha256(secret, &[b"v0:", timestamp.as_bytes(), b":", body])?;
    if constant_time_eq(&expected, &provided) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[cfg(test)]
pub(crate) fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let digest = hmac_sha256(secret, &[b"v0:", timestamp.as_bytes(), b":", body]).unwrap();
    format!("v0={}", hex::encode(digest))
}
