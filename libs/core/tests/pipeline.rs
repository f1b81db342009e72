use std::sync::Arc;

use ash_core::{
    ActivityBuilder, ActivityStream, Actor, FixedClock, Generator, Outcome, ParseError, Parser,
    ParserContext, Platform, Target, UserInfo, ValidationError,
};
use ash_testutil::{assert_matches_schema, to_json_value};
use serde::Serialize;
use serde_json::{Value, json};

/// Minimal parser over `{ "id", "from", "to", "text", "url" }` payloads.
struct EchoParser {
    ctx: ParserContext,
}

#[derive(Debug, Clone, Serialize)]
struct EchoMessage {
    id: String,
    from: String,
    to: String,
    text: Option<String>,
    url: Option<String>,
}

impl Parser for EchoParser {
    type Normalized = EchoMessage;

    fn platform(&self) -> Platform {
        Platform::Sms
    }

    fn context(&self) -> &ParserContext {
        &self.ctx
    }

    fn normalize(
        &self,
        raw: &Value,
        _user: Option<&UserInfo>,
    ) -> Result<Option<EchoMessage>, ParseError> {
        let obj = raw.as_object().ok_or(ParseError::NotAnObject)?;
        if obj.get("typing").is_some() {
            return Ok(None);
        }
        let field = |key: &'static str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Ok(Some(EchoMessage {
            id: field("id").ok_or(ParseError::MissingField("id"))?,
            from: field("from").ok_or(ParseError::MissingField("from"))?,
            to: field("to").ok_or(ParseError::MissingField("to"))?,
            text: field("text"),
            url: field("url"),
        }))
    }

    fn parse(&self, msg: &EchoMessage) -> Result<ActivityStream, ParseError> {
        ActivityBuilder::new(
            &self.ctx,
            &msg.id,
            Actor::person(&msg.from),
            Target::person(&msg.to),
        )
        .text(msg.text.as_deref())
        .attachment(msg.url.clone().map(ash_core::Attachment::new))
        .build()
    }
}

fn parser() -> EchoParser {
    EchoParser {
        ctx: ParserContext::new(
            Generator::new(Platform::Sms, "pipeline-test"),
            Arc::new(FixedClock::from_unix(1_700_000_000)),
        ),
    }
}

#[test]
fn text_event_runs_whole_pipeline() {
    let parser = parser();
    let raw = json!({ "id": "m1", "from": "+1", "to": "+2", "text": "hi" });
    assert_eq!(parser.events(&raw), vec![raw.clone()]);
    let Outcome::Activity(activity) = parser.process(&raw, None).unwrap() else {
        panic!("expected activity");
    };
    let value = to_json_value(&*activity).unwrap();
    assert_matches_schema("libs/core/schemas/activity.schema.json", &value).unwrap();
    assert_eq!(value["published"], "2023-11-14T22:13:20Z");
    assert_eq!(value["generator"]["name"], "sms");
}

#[test]
fn non_http_media_is_rejected_not_emitted() {
    let parser = parser();
    let raw = json!({ "id": "m2", "from": "+1", "to": "+2", "url": "ftp://files.example.com/a.bin" });
    match parser.process(&raw, None).unwrap() {
        Outcome::Rejected(ValidationError::InvalidUrl { field, .. }) => assert_eq!(field, "object.url"),
        other => panic!("unexpected outcome {other:?}"),
    }
    let activity = parser.parse(&parser.normalize(&raw, None).unwrap().unwrap()).unwrap();
    assert!(parser.validate(activity).is_none());
}

#[test]
fn ignored_and_broken_payloads() {
    let parser = parser();
    assert_eq!(parser.process(&json!({ "typing": true }), None).unwrap(), Outcome::Ignored);
    assert_eq!(parser.process(&json!("nope"), None).unwrap_err(), ParseError::NotAnObject);
    assert_eq!(
        parser.process(&json!({ "id": "m3", "from": "+1", "to": "+2" }), None).unwrap_err(),
        ParseError::Empty
    );
}
