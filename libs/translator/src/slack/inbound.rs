use ash_core::clock::from_slack_ts;
use ash_core::{
    ActivityBuilder, ActivityStream, Actor, Attachment, Callback, ParseError, Parser,
    ParserContext, Platform, Target, UserInfo,
};
use serde::Serialize;
use serde_json::Value;

use crate::json::{ensure_object, required, str_at, str_ptr};

const MESSAGE_SUBTYPES: &[&str] = &["file_share", "thread_broadcast", "me_message"];

/// Slack message or interaction flattened to the fields the activity needs.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlackMessage {
    pub ts: String,
    pub user: String,
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<Callback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
}

impl SlackMessage {
    fn is_direct(&self) -> bool {
        self.channel_type.as_deref() == Some("im") || self.channel.starts_with('D')
    }
}

/// Returns the challenge of a `url_verification` handshake, if `raw` is one.
///
/// ```
/// use ash_translator::slack::url_verification_challenge;
/// use serde_json::json;
///
/// let raw = json!({ "type": "url_verification", "challenge": "abc" });
/// assert_eq!(url_verification_challenge(&raw), Some("abc"));
/// assert_eq!(url_verification_challenge(&json!({ "type": "event_callback" })), None);
/// ```
pub fn url_verification_challenge(raw: &Value) -> Option<&str> {
    if str_at(raw, "type") == Some("url_verification") {
        str_at(raw, "challenge")
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct SlackParser {
    ctx: ParserContext,
}

impl SlackParser {
    pub fn new(ctx: ParserContext) -> Self {
        Self { ctx }
    }

    fn normalize_event(
        &self,
        event: &Value,
        team: Option<&str>,
        user: Option<&UserInfo>,
    ) -> Result<Option<SlackMessage>, ParseError> {
        match str_at(event, "type") {
            Some("message") | Some("app_mention") => {}
            other => {
                tracing::debug!(event_type = ?other, "slack event is not a message");
                return Ok(None);
            }
        }
        if str_at(event, "bot_id").is_some() {
            return Ok(None);
        }
        let subtype = str_at(event, "subtype");
        if let Some(subtype) = subtype {
            if !MESSAGE_SUBTYPES.contains(&subtype) {
                tracing::debug!(subtype, "slack message subtype skipped");
                return Ok(None);
            }
        }

        let file = event
            .get("files")
            .and_then(Value::as_array)
            .and_then(|files| files.first())
            .and_then(file_attachment);

        Ok(Some(SlackMessage {
            ts: required(event, "ts")?.to_string(),
            user: required(event, "user")?.to_string(),
            channel: required(event, "channel")?.to_string(),
            channel_type: str_at(event, "channel_type").map(str::to_string),
            team: team
                .or_else(|| str_at(event, "team"))
                .map(str::to_string),
            subtype: subtype.map(str::to_string),
            text: event.get("text").and_then(Value::as_str).map(str::to_string),
            thread_ts: str_at(event, "thread_ts").map(str::to_string),
            file,
            callback: None,
            user_info: user.cloned(),
        }))
    }

    fn normalize_interaction(
        &self,
        raw: &Value,
        user: Option<&UserInfo>,
    ) -> Result<Option<SlackMessage>, ParseError> {
        let Some(action) = raw
            .get("actions")
            .and_then(Value::as_array)
            .and_then(|actions| actions.first())
        else {
            return Ok(None);
        };

        let id = str_at(action, "action_id")
            .or_else(|| str_at(raw, "callback_id"))
            .ok_or(ParseError::MissingField("action_id"))?;
        let value = str_at(action, "value")
            .or_else(|| str_ptr(action, "/selected_option/value"))
            .map(str::to_string);
        let name = str_ptr(action, "/text/text")
            .or_else(|| str_at(action, "name"))
            .map(str::to_string);
        let ts = str_at(action, "action_ts")
            .or_else(|| str_at(raw, "action_ts"))
            .or_else(|| str_at(raw, "trigger_id"))
            .ok_or(ParseError::MissingField("action_ts"))?;

        Ok(Some(SlackMessage {
            ts: ts.to_string(),
            user: str_ptr(raw, "/user/id")
                .ok_or(ParseError::MissingField("user"))?
                .to_string(),
            channel: str_ptr(raw, "/channel/id")
                .ok_or(ParseError::MissingField("channel"))?
                .to_string(),
            channel_type: None,
            team: str_ptr(raw, "/team/id").map(str::to_string),
            subtype: str_at(raw, "type").map(str::to_string),
            text: None,
            thread_ts: str_ptr(raw, "/message/thread_ts").map(str::to_string),
            file: None,
            callback: Some(Callback {
                id: id.to_string(),
                value,
                name,
            }),
            user_info: user.cloned(),
        }))
    }
}

fn file_attachment(file: &Value) -> Option<Attachment> {
    let url = str_at(file, "url_private").or_else(|| str_at(file, "permalink"))?;
    let preview = str_at(file, "thumb_360")
        .or_else(|| str_at(file, "thumb_160"))
        .map(str::to_string);
    Some(
        Attachment::new(url)
            .with_media_type(str_at(file, "mimetype").map(str::to_string))
            .with_name(
                str_at(file, "name")
                    .or_else(|| str_at(file, "title"))
                    .map(str::to_string),
            )
            .with_preview(preview),
    )
}

impl Parser for SlackParser {
    type Normalized = SlackMessage;

    fn platform(&self) -> Platform {
        Platform::Slack
    }

    fn context(&self) -> &ParserContext {
        &self.ctx
    }

    fn normalize(
        &self,
        raw: &Value,
        user: Option<&UserInfo>,
    ) -> Result<Option<SlackMessage>, ParseError> {
        ensure_object(raw)?;
        match str_at(raw, "type") {
            Some("url_verification") => Ok(None),
            Some("block_actions") | Some("interactive_message") => {
                self.normalize_interaction(raw, user)
            }
            Some("event_callback") => {
                let event = raw.get("event").ok_or(ParseError::MissingField("event"))?;
                ensure_object(event)?;
                self.normalize_event(event, str_at(raw, "team_id"), user)
            }
            _ => self.normalize_event(raw, None, user),
        }
    }

    fn parse(&self, msg: &SlackMessage) -> Result<ActivityStream, ParseError> {
        let target = if msg.is_direct() {
            Target::person(&msg.channel)
        } else {
            Target::group(&msg.channel)
        };
        ActivityBuilder::new(
            &self.ctx,
            &msg.ts,
            Actor::from_user(&msg.user, msg.user_info.as_ref()),
            target,
        )
        .text(msg.text.as_deref())
        .attachment(msg.file.clone())
        .callback(msg.callback.clone())
        .in_reply_to(msg.thread_ts.as_deref())
        .published(from_slack_ts(&msg.ts))
        .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash_core::testkit::fixed_context;
    use ash_core::{ActivityObject, ObjectContext, Outcome, TargetKind};
    use ash_testutil::load_fixture;
    use serde_json::json;

    fn parser() -> SlackParser {
        SlackParser::new(fixed_context(Platform::Slack))
    }

    fn activity(outcome: Outcome) -> ActivityStream {
        match outcome {
            Outcome::Activity(activity) => *activity,
            other => panic!("expected activity, got {other:?}"),
        }
    }

    #[test]
    fn text_event_becomes_threaded_note() {
        let parser = parser();
        let raw = load_fixture("slack", "message_text");
        let info = UserInfo::new("U2147483697").with_name("Spock");
        let activity = activity(parser.process(&raw, Some(&info)).unwrap());

        assert_eq!(activity.generator.id, "slack-test");
        assert_eq!(activity.generator.name, "slack");
        assert_eq!(activity.published, "2023-11-14T22:13:20.0001Z");
        assert_eq!(activity.actor.name.as_deref(), Some("Spock"));
        assert_eq!(activity.target.kind, TargetKind::Group);
        match activity.object {
            ActivityObject::Note(note) => {
                assert_eq!(note.id, "1700000000.000100");
                assert_eq!(note.content, "Live long and prosper.");
                assert_eq!(note.in_reply_to.as_deref(), Some("1699999990.000200"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn file_share_becomes_image_with_preview_and_caption() {
        let parser = parser();
        let raw = load_fixture("slack", "message_file");
        let normalized = parser.normalize(&raw, None).unwrap().unwrap();
        assert_eq!(normalized.team.as_deref(), Some("T0001"));
        let activity = parser.parse(&normalized).unwrap();
        match activity.object {
            ActivityObject::Image(media) => {
                assert_eq!(media.name, "whiteboard.png");
                assert_eq!(media.media_type, "image/png");
                assert_eq!(
                    media.preview.as_ref().map(|p| p.href()),
                    Some("https://files.slack.com/files-tmb/T0001-F0123ABC/whiteboard_360.png")
                );
                assert_eq!(media.content.as_deref(), Some("whiteboard from standup"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn file_without_name_uses_title_and_small_thumb() {
        let file = json!({
            "url_private": "https://files.slack.com/files-pri/T1-F1/report",
            "title": "Quarterly report",
            "mimetype": "application/pdf",
            "thumb_160": "https://files.slack.com/t/160.png"
        });
        let attachment = file_attachment(&file).unwrap();
        assert_eq!(attachment.name.as_deref(), Some("Quarterly report"));
        assert_eq!(attachment.preview.as_deref(), Some("https://files.slack.com/t/160.png"));
    }

    #[test]
    fn mentions_broadcasts_and_me_messages_are_accepted() {
        let parser = parser();
        let events = [
            json!({ "type": "app_mention", "user": "U1", "channel": "C1", "ts": "1700000000.000100", "text": "<@UBOT> status?" }),
            json!({ "type": "message", "subtype": "thread_broadcast", "user": "U1", "channel": "C1",
                    "ts": "1700000000.000200", "thread_ts": "1699999990.000200", "text": "also here" }),
            json!({ "type": "message", "subtype": "me_message", "user": "U1", "channel": "C1", "ts": "1700000000.000300", "text": "waves" }),
        ];
        let contents: Vec<String> = events
            .iter()
            .map(|raw| activity(parser.process(raw, None).unwrap()))
            .map(|activity| activity.object.content().unwrap_or_default().to_string())
            .collect();
        assert_eq!(contents, ["<@UBOT> status?", "also here", "waves"]);

        let broadcast = activity(parser.process(&events[1], None).unwrap());
        assert_eq!(broadcast.object.in_reply_to(), Some("1699999990.000200"));
    }

    #[test]
    fn bot_messages_and_edits_are_ignored() {
        let parser = parser();
        let raw = load_fixture("slack", "bot_message");
        assert_eq!(parser.process(&raw, None).unwrap(), Outcome::Ignored);

        let edit = json!({
            "type": "message",
            "subtype": "message_changed",
            "channel": "C1",
            "ts": "1700000000.1"
        });
        assert_eq!(parser.process(&edit, None).unwrap(), Outcome::Ignored);
    }

    #[test]
    fn url_verification_is_ignored() {
        let parser = parser();
        let raw = load_fixture("slack", "url_verification");
        assert_eq!(parser.process(&raw, None).unwrap(), Outcome::Ignored);
    }

    #[test]
    fn block_action_becomes_callback_note() {
        let parser = parser();
        let raw = load_fixture("slack", "block_actions");
        let activity = activity(parser.process(&raw, None).unwrap());
        assert_eq!(activity.published, "2023-11-14T22:18:20.123456Z");
        match activity.object {
            ActivityObject::Note(note) => {
                assert_eq!(note.content, "deploy-42");
                assert_eq!(note.in_reply_to.as_deref(), Some("1699999990.000200"));
                assert_eq!(
                    note.context,
                    Some(ObjectContext::Callback {
                        id: "approve_deploy".into(),
                        value: Some("deploy-42".into()),
                        name: Some("Approve".into()),
                    })
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn legacy_interactive_message_uses_callback_id() {
        let parser = parser();
        let raw = json!({
            "type": "interactive_message",
            "callback_id": "wopr_game",
            "action_ts": "1700000000.5",
            "user": { "id": "U1" },
            "channel": { "id": "D1" },
            "actions": [{ "name": "game", "type": "select", "selected_option": { "value": "chess" } }]
        });
        let msg = parser.normalize(&raw, None).unwrap().unwrap();
        let callback = msg.callback.clone().unwrap();
        assert_eq!(callback.id, "wopr_game");
        assert_eq!(callback.value.as_deref(), Some("chess"));
        assert_eq!(callback.name.as_deref(), Some("game"));
        let activity = parser.parse(&msg).unwrap();
        assert_eq!(activity.target.kind, TargetKind::Person);
    }

    #[test]
    fn missing_user_is_an_error() {
        let parser = parser();
        let raw = json!({ "type": "message", "channel": "C1", "ts": "1700000000.1", "text": "x" });
        assert_eq!(
            parser.normalize(&raw, None).unwrap_err(),
            ParseError::MissingField("user")
        );
    }

    #[test]
    fn empty_text_without_files_is_empty() {
        let parser = parser();
        let raw = json!({ "type": "message", "user": "U1", "channel": "C1", "ts": "1700000000.1", "text": "" });
        assert_eq!(parser.process(&raw, None).unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn unparsable_ts_falls_back_to_clock() {
        let parser = parser();
        let raw = json!({ "type": "message", "user": "U1", "channel": "C1", "ts": "abc", "text": "hi" });
        let activity = activity(parser.process(&raw, None).unwrap());
        assert_eq!(activity.published, "2023-11-14T22:13:20Z");
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert_eq!(
            parser().normalize(&json!("hello"), None).unwrap_err(),
            ParseError::NotAnObject
        );
    }
}
