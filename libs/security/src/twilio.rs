//! Twilio request validation (`X-Twilio-Signature`).
//!
//! The signature is `base64(HMAC-SHA1(auth_token, url + k1 + v1 + k2 + v2 ...))` with the
//! POST parameters sorted by key.

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};

use crate::{SignatureError, constant_time_eq, hmac_sha1};

/// Computes the expected signature for `url` and the posted form `params`.
pub fn twilio_signature(
    auth_token: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<String, SignatureError> {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(b.1)));
    let mut payload = String::from(url);
    for (key, value) in sorted {
        payload.push_str(key);
        payload.push_str(value);
    }
    Ok(B64.encode(hmac_sha1(auth_token, &[payload.as_bytes()])?))
}

pub fn verify_twilio(
    auth_token: &str,
    url: &str,
    params: &[(&str, &str)],
    signature: Option<&str>,
) -> Result<(), SignatureError> {
    if auth_token.is_empty() {
        return Err(SignatureError::InvalidKey);
    }
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::MissingHeader("X-Twilio-Signature"))?;
    let expected = twilio_signature(auth_token, url, params)?;
    if constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
