use ash_core::{
    ActivityBuilder, ActivityStream, Actor, Attachment, ParseError, Parser, ParserContext,
    Platform, Target, UserInfo,
};
use serde::Serialize;
use serde_json::Value;

use crate::json::{ensure_object, required, str_at};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SmsMessage {
    pub sid: String,
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub media: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
}

#[derive(Debug, Clone)]
pub struct SmsParser {
    ctx: ParserContext,
}

impl SmsParser {
    pub fn new(ctx: ParserContext) -> Self {
        Self { ctx }
    }
}

/// Twilio attaches at most this many media items to one message.
pub const MAX_MEDIA: usize = 10;

/// Twilio posts form fields, so every value arrives as a string.
fn media_items(raw: &Value) -> Result<Vec<Attachment>, ParseError> {
    let count = match str_at(raw, "NumMedia") {
        Some(n) => n
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|count| *count <= MAX_MEDIA)
            .ok_or_else(|| ParseError::invalid("NumMedia", n))?,
        None => 0,
    };
    let mut media = Vec::new();
    for idx in 0..count {
        let Some(url) = str_at(raw, &format!("MediaUrl{idx}")) else {
            continue;
        };
        media.push(
            Attachment::new(url)
                .with_media_type(str_at(raw, &format!("MediaContentType{idx}")).map(str::to_string)),
        );
    }
    Ok(media)
}

impl Parser for SmsParser {
    type Normalized = SmsMessage;

    fn platform(&self) -> Platform {
        Platform::Sms
    }

    fn context(&self) -> &ParserContext {
        &self.ctx
    }

    fn normalize(
        &self,
        raw: &Value,
        user: Option<&UserInfo>,
    ) -> Result<Option<SmsMessage>, ParseError> {
        ensure_object(raw)?;
        // status callbacks share the endpoint but carry no inbound content
        if str_at(raw, "MessageStatus").is_some() && str_at(raw, "Body").is_none() {
            return Ok(None);
        }
        let sid = str_at(raw, "MessageSid")
            .or_else(|| str_at(raw, "SmsSid"))
            .ok_or(ParseError::MissingField("MessageSid"))?;
        let media = media_items(raw)?;
        if media.len() > 1 {
            tracing::debug!(count = media.len(), "mms carries extra media; keeping the first");
        }
        Ok(Some(SmsMessage {
            sid: sid.to_string(),
            from: required(raw, "From")?.to_string(),
            to: required(raw, "To")?.to_string(),
            body: raw.get("Body").and_then(Value::as_str).map(str::to_string),
            media,
            user_info: user.cloned(),
        }))
    }

    fn parse(&self, msg: &SmsMessage) -> Result<ActivityStream, ParseError> {
        ActivityBuilder::new(
            &self.ctx,
            &msg.sid,
            Actor::from_user(&msg.from, msg.user_info.as_ref()),
            Target::person(&msg.to),
        )
        .text(msg.body.as_deref())
        .attachment(msg.media.first().cloned())
        .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash_core::testkit::fixed_context;
    use ash_core::{ActivityObject, Outcome, TargetKind};
    use ash_testutil::load_fixture;
    use serde_json::json;

    fn parser() -> SmsParser {
        SmsParser::new(fixed_context(Platform::Sms))
    }

    #[test]
    fn text_uses_clock_for_published() {
        let parser = parser();
        let Outcome::Activity(activity) = parser.process(&load_fixture("sms", "text"), None).unwrap()
        else {
            panic!("expected activity");
        };
        assert_eq!(activity.published, "2023-11-14T22:13:20Z");
        assert_eq!(activity.actor.id, "+15550001111");
        assert_eq!(activity.target.id, "+15557770000");
        assert_eq!(activity.target.kind, TargetKind::Person);
        assert_eq!(activity.object.content(), Some("Hello from my phone"));
    }

    #[test]
    fn mms_becomes_image() {
        let parser = parser();
        let msg = parser.normalize(&load_fixture("sms", "mms"), None).unwrap().unwrap();
        assert_eq!(msg.media.len(), 1);
        let activity = parser.parse(&msg).unwrap();
        match activity.object {
            ActivityObject::Image(media) => {
                assert_eq!(media.media_type, "image/jpeg");
                assert_eq!(media.name, "ME1");
                assert_eq!(media.content, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_num_media_is_invalid_field() {
        let raw = json!({ "MessageSid": "SM1", "From": "+1", "To": "+2", "NumMedia": "many" });
        assert!(matches!(
            parser().normalize(&raw, None).unwrap_err(),
            ParseError::InvalidField { field: "NumMedia", .. }
        ));
    }

    #[test]
    fn num_media_above_twilio_cap_is_invalid_field() {
        for count in ["11", "18446744073709551615", "99999999999999999999"] {
            let raw = json!({ "MessageSid": "SM1", "From": "+1", "To": "+2", "Body": "hi", "NumMedia": count });
            assert!(
                matches!(
                    parser().normalize(&raw, None).unwrap_err(),
                    ParseError::InvalidField { field: "NumMedia", .. }
                ),
                "NumMedia {count}"
            );
        }
    }

    #[test]
    fn num_media_at_cap_skips_missing_urls() {
        let raw = json!({
            "MessageSid": "SM1", "From": "+1", "To": "+2", "NumMedia": "10",
            "MediaUrl9": "https://api.twilio.com/media/ME9", "MediaContentType9": "video/mp4"
        });
        let msg = parser().normalize(&raw, None).unwrap().unwrap();
        assert_eq!(msg.media.len(), 1);
        assert_eq!(msg.media[0].url, "https://api.twilio.com/media/ME9");
    }

    #[test]
    fn status_callback_is_ignored() {
        let raw = json!({ "MessageSid": "SM1", "MessageStatus": "delivered", "From": "+1", "To": "+2" });
        assert_eq!(parser().process(&raw, None).unwrap(), Outcome::Ignored);
    }
}
