use crate::SignatureError;

/// Kik stamps every webhook with `X-Kik-Username`; it must name our bot.
/// Usernames are compared case-insensitively.
pub fn verify_kik_username(expected: &str, header: Option<&str>) -> Result<(), SignatureError> {
    let provided = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(SignatureError::MissingHeader("X-Kik-Username"))?;
    if provided.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        tracing::warn!(provided, "kik webhook for another bot");
        Err(SignatureError::WrongRecipient(provided.to_string()))
    }
}
