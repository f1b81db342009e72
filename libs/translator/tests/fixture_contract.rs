use ash_core::testkit::fixed_context;
use ash_core::{ActivityObject, ActivityStream, Outcome, Parser, Platform, UserInfo};
use ash_testutil::{assert_matches_schema, load_fixture, to_json_value};
use ash_translator::{KikParser, MessengerParser, SlackParser, SmsParser};

const ACTIVITY_SCHEMA: &str = "libs/core/schemas/activity.schema.json";

/// Runs every event of a fixture through the pipeline and keeps the emitted activities.
fn activities<P: Parser>(parser: &P, platform: &str, name: &str) -> Vec<ActivityStream> {
    let raw = load_fixture(platform, name);
    parser
        .events(&raw)
        .iter()
        .filter_map(|event| match parser.process(event, None) {
            Ok(Outcome::Activity(activity)) => Some(*activity),
            Ok(Outcome::Ignored) => None,
            other => panic!("{platform}/{name}: unexpected outcome {other:?}"),
        })
        .collect()
}

fn assert_schema(activities: &[ActivityStream]) {
    for activity in activities {
        let value = to_json_value(activity).expect("serialize activity");
        assert_matches_schema(ACTIVITY_SCHEMA, &value).expect("activity matches schema");
    }
}

#[test]
fn slack_fixtures_produce_schema_valid_activities() {
    let parser = SlackParser::new(fixed_context(Platform::Slack));
    for name in ["message_text", "message_file", "block_actions"] {
        let out = activities(&parser, "slack", name);
        assert_eq!(out.len(), 1, "{name}");
        assert_schema(&out);
    }
    assert!(activities(&parser, "slack", "bot_message").is_empty());
    assert!(activities(&parser, "slack", "url_verification").is_empty());
}

#[test]
fn kik_batches_skip_typing_events() {
    let parser = KikParser::new(fixed_context(Platform::Kik));
    let out = activities(&parser, "kik", "text");
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].published, "2023-11-14T22:13:20.123Z");
    for name in ["picture", "video", "link", "suggested_response"] {
        let out = activities(&parser, "kik", name);
        assert_eq!(out.len(), 1, "{name}");
        assert_schema(&out);
    }
}

#[test]
fn messenger_entries_are_flattened() {
    let parser = MessengerParser::new(fixed_context(Platform::Messenger));
    let out = activities(&parser, "messenger", "text");
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].object.content(), Some("hello, world!"));
    assert_eq!(out[0].published, "2023-11-14T22:13:20.458Z");
    for name in ["image", "file", "quick_reply", "postback"] {
        let out = activities(&parser, "messenger", name);
        assert_eq!(out.len(), 1, "{name}");
        assert_schema(&out);
    }
    assert!(activities(&parser, "messenger", "echo").is_empty());
}

#[test]
fn sms_and_mms_validate() {
    let parser = SmsParser::new(fixed_context(Platform::Sms));
    let text = activities(&parser, "sms", "text");
    let mms = activities(&parser, "sms", "mms");
    assert!(matches!(text[0].object, ActivityObject::Note(_)));
    assert!(matches!(mms[0].object, ActivityObject::Image(_)));
    assert_schema(&text);
    assert_schema(&mms);
}

#[test]
fn generator_names_the_platform_and_instance() {
    let parser = SmsParser::new(fixed_context(Platform::Sms));
    let activity = &activities(&parser, "sms", "text")[0];
    assert_eq!(activity.generator.name, "sms");
    assert_eq!(activity.generator.id, "sms-test");
    assert_eq!(activity.platform(), Some(Platform::Sms));
}

#[test]
fn user_profile_enriches_actor() {
    let parser = MessengerParser::new(fixed_context(Platform::Messenger));
    let raw = ash_testutil::fixture!("messenger", "text");
    let event = parser.events(&raw).remove(0);
    let user = UserInfo::new("USER_PSID")
        .with_name("Ada Lovelace")
        .with_avatar("https://cdn.example.com/ada.png");
    let Outcome::Activity(activity) = parser.process(&event, Some(&user)).unwrap() else {
        panic!("expected activity");
    };
    assert_eq!(activity.actor.name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(activity.actor.icon.as_deref(), Some("https://cdn.example.com/ada.png"));
    assert_eq!(activity.actor.preferred_username, None);
}
