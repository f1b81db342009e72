use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// JSON-LD context carried by every emitted activity.
pub const ACTIVITY_STREAMS_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";

/// Supported messaging platforms.
///
/// ```
/// use ash_core::Platform;
///
/// let p = Platform::Messenger;
/// assert_eq!(p.as_str(), "messenger");
/// assert_eq!("sms".parse::<Platform>().unwrap(), Platform::Sms);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Kik,
    Slack,
    Messenger,
    Sms,
}

impl Platform {
    /// Returns the lowercase identifier used in generator names, log fields and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Kik => "kik",
            Platform::Slack => "slack",
            Platform::Messenger => "messenger",
            Platform::Sms => "sms",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kik" => Ok(Platform::Kik),
            "slack" => Ok(Platform::Slack),
            "messenger" | "facebook" => Ok(Platform::Messenger),
            "sms" | "twilio" => Ok(Platform::Sms),
            other => Err(ParseError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Profile data a caller already holds for the sender of a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// Service (and service instance) that produced an activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Generator {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GeneratorKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum GeneratorKind {
    #[default]
    Service,
}

impl Generator {
    /// Builds the generator for one adapter instance of `platform`.
    ///
    /// ```
    /// use ash_core::{Generator, Platform};
    ///
    /// let generator = Generator::new(Platform::Kik, "kik-1");
    /// assert_eq!(generator.name, "kik");
    /// assert_eq!(generator.id, "kik-1");
    /// ```
    pub fn new(platform: Platform, instance_id: impl Into<String>) -> Self {
        Self {
            id: instance_id.into(),
            name: platform.as_str().to_string(),
            kind: GeneratorKind::Service,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ActorKind {
    #[default]
    Person,
    Application,
}

/// Sender of an activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: ActorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Actor {
    pub fn person(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ActorKind::Person,
            name: None,
            preferred_username: None,
            icon: None,
        }
    }

    /// Actor for `id`, enriched with whatever profile data the caller supplied.
    /// Profile fields only apply when the profile belongs to the same user (or carries no id).
    pub fn from_user(id: impl Into<String>, user: Option<&UserInfo>) -> Self {
        let mut actor = Self::person(id);
        if let Some(info) = user.filter(|info| info.id.is_empty() || info.id == actor.id) {
            actor.name = info.name.clone();
            actor.preferred_username = info.username.clone();
            actor.icon = info.avatar.clone();
        }
        actor
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TargetKind {
    #[default]
    Group,
    Person,
}

/// Conversation the activity was addressed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Target {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: TargetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Target {
    pub fn group(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: TargetKind::Group,
            name: None,
        }
    }

    pub fn person(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: TargetKind::Person,
            name: None,
        }
    }
}

/// Context attached to objects produced by interactive callbacks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ObjectContext {
    Callback {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Preview {
    Link { href: String },
}

impl Preview {
    pub fn href(&self) -> &str {
        match self {
            Preview::Link { href } => href,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ObjectContext>,
}

/// Shared shape of `Image`, `Video` and `Document` objects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: String,
    pub url: String,
    pub media_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Preview>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ObjectContext>,
}

/// Payload of an activity, tagged by its Activity Streams `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ActivityObject {
    Note(Note),
    Image(Media),
    Video(Media),
    Document(Media),
}

impl ActivityObject {
    pub fn id(&self) -> &str {
        match self {
            ActivityObject::Note(note) => &note.id,
            ActivityObject::Image(media)
            | ActivityObject::Video(media)
            | ActivityObject::Document(media) => &media.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ActivityObject::Note(_) => "Note",
            ActivityObject::Image(_) => "Image",
            ActivityObject::Video(_) => "Video",
            ActivityObject::Document(_) => "Document",
        }
    }

    /// Text content of a note, or the caption of a media object.
    pub fn content(&self) -> Option<&str> {
        match self {
            ActivityObject::Note(note) => Some(note.content.as_str()),
            ActivityObject::Image(media)
            | ActivityObject::Video(media)
            | ActivityObject::Document(media) => media.content.as_deref(),
        }
    }

    pub fn media(&self) -> Option<&Media> {
        match self {
            ActivityObject::Note(_) => None,
            ActivityObject::Image(media)
            | ActivityObject::Video(media)
            | ActivityObject::Document(media) => Some(media),
        }
    }

    pub fn in_reply_to(&self) -> Option<&str> {
        match self {
            ActivityObject::Note(note) => note.in_reply_to.as_deref(),
            ActivityObject::Image(media)
            | ActivityObject::Video(media)
            | ActivityObject::Document(media) => media.in_reply_to.as_deref(),
        }
    }

    pub fn context(&self) -> Option<&ObjectContext> {
        match self {
            ActivityObject::Note(note) => note.context.as_ref(),
            ActivityObject::Image(media)
            | ActivityObject::Video(media)
            | ActivityObject::Document(media) => media.context.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ActivityKind {
    #[default]
    Create,
}

/// Canonical Activity Streams 2.0 envelope emitted by every adapter.
///
/// ```
/// use ash_core::{
///     ActivityKind, ActivityObject, ActivityStream, Actor, Generator, Note, Platform, Target,
///     ACTIVITY_STREAMS_CONTEXT,
/// };
///
/// let activity = ActivityStream {
///     context: ACTIVITY_STREAMS_CONTEXT.into(),
///     kind: ActivityKind::Create,
///     generator: Generator::new(Platform::Slack, "slack-1"),
///     published: "2024-01-01T00:00:00Z".into(),
///     actor: Actor::person("U1"),
///     target: Target::group("C1"),
///     object: ActivityObject::Note(Note {
///         id: "1704067200.000100".into(),
///         content: "hello".into(),
///         in_reply_to: None,
///         context: None,
///     }),
/// };
/// let json = serde_json::to_value(&activity).unwrap();
/// assert_eq!(json["@context"], ACTIVITY_STREAMS_CONTEXT);
/// assert_eq!(json["object"]["type"], "Note");
/// assert_eq!(json["generator"]["type"], "Service");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityStream {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "type", default)]
    pub kind: ActivityKind,
    pub generator: Generator,
    pub published: String, // RFC3339, UTC
    pub actor: Actor,
    pub target: Target,
    pub object: ActivityObject,
}

impl ActivityStream {
    pub fn platform(&self) -> Option<Platform> {
        self.generator.name.parse().ok()
    }
}
