//! Kind selection shared by every platform parser.
//!
//! Parsers extract platform fields into an [`ActivityBuilder`]; the builder decides which
//! Activity Streams object the message becomes and stamps the envelope fields.

use time::OffsetDateTime;

use crate::clock::format_published;
use crate::error::ParseError;
use crate::parser::ParserContext;
use crate::types::{
    ACTIVITY_STREAMS_CONTEXT, ActivityKind, ActivityObject, ActivityStream, Actor, Media, Note,
    ObjectContext, Preview, Target,
};

/// Media kind of an attachment, as far as the platform or mime type tells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Document,
}

impl MediaKind {
    /// Classifies by mime prefix.
    ///
    /// ```
    /// use ash_core::MediaKind;
    ///
    /// assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Image);
    /// assert_eq!(MediaKind::from_mime("VIDEO/mp4"), MediaKind::Video);
    /// assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::Document);
    /// ```
    pub fn from_mime(mime: &str) -> Self {
        let lower = mime.trim().to_ascii_lowercase();
        if lower.starts_with("image/") {
            MediaKind::Image
        } else if lower.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Document
        }
    }

    fn default_mime(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/jpeg",
            MediaKind::Video => "video/mp4",
            MediaKind::Document => "application/octet-stream",
        }
    }
}

/// File or media reference pulled out of a platform payload.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Attachment {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Kind declared by the platform itself; wins over the mime type.
    #[serde(skip)]
    pub kind: Option<MediaKind>,
}

impl Attachment {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_media_type(mut self, media_type: Option<String>) -> Self {
        self.media_type = media_type.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn with_preview(mut self, preview: Option<String>) -> Self {
        self.preview = preview.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn resolved_kind(&self) -> MediaKind {
        match (self.kind, self.media_type.as_deref()) {
            (Some(kind), _) => kind,
            (None, Some(mime)) => MediaKind::from_mime(mime),
            (None, None) => MediaKind::Document,
        }
    }

    /// Last path segment of the url, used when the platform gives no file name.
    fn fallback_name(&self) -> String {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("attachment")
            .to_string()
    }
}

/// Interactive callback (button press, quick reply, postback).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Callback {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ActivityBuilder<'a> {
    ctx: &'a ParserContext,
    id: String,
    actor: Actor,
    target: Target,
    text: Option<String>,
    attachment: Option<Attachment>,
    callback: Option<Callback>,
    in_reply_to: Option<String>,
    published: Option<OffsetDateTime>,
}

impl<'a> ActivityBuilder<'a> {
    pub fn new(ctx: &'a ParserContext, id: impl Into<String>, actor: Actor, target: Target) -> Self {
        Self {
            ctx,
            id: id.into(),
            actor,
            target,
            text: None,
            attachment: None,
            callback: None,
            in_reply_to: None,
            published: None,
        }
    }

    pub fn text(mut self, text: Option<&str>) -> Self {
        self.text = text.map(str::to_string).filter(|t| !t.trim().is_empty());
        self
    }

    pub fn attachment(mut self, attachment: Option<Attachment>) -> Self {
        self.attachment = attachment.filter(|a| !a.url.trim().is_empty());
        self
    }

    pub fn callback(mut self, callback: Option<Callback>) -> Self {
        self.callback = callback;
        self
    }

    pub fn in_reply_to(mut self, thread: Option<&str>) -> Self {
        self.in_reply_to = thread.map(str::to_string).filter(|t| !t.is_empty());
        self
    }

    pub fn published(mut self, ts: Option<OffsetDateTime>) -> Self {
        self.published = ts;
        self
    }

    /// Callback first, then media, then plain text.
    pub fn build(self) -> Result<ActivityStream, ParseError> {
        let published = format_published(self.published.unwrap_or_else(|| self.ctx.now()));
        let object = match (self.callback, self.attachment, self.text) {
            (Some(callback), _, text) => {
                let content = callback
                    .value
                    .clone()
                    .filter(|v| !v.trim().is_empty())
                    .or(text)
                    .or_else(|| callback.name.clone())
                    .unwrap_or_else(|| callback.id.clone());
                ActivityObject::Note(Note {
                    id: self.id,
                    content,
                    in_reply_to: self.in_reply_to,
                    context: Some(ObjectContext::Callback {
                        id: callback.id,
                        value: callback.value,
                        name: callback.name,
                    }),
                })
            }
            (None, Some(attachment), text) => {
                let kind = attachment.resolved_kind();
                let name = attachment
                    .name
                    .clone()
                    .unwrap_or_else(|| attachment.fallback_name());
                let media = Media {
                    id: self.id,
                    media_type: attachment
                        .media_type
                        .clone()
                        .unwrap_or_else(|| kind.default_mime().to_string()),
                    name,
                    preview: attachment.preview.map(|href| Preview::Link { href }),
                    url: attachment.url,
                    content: text,
                    in_reply_to: self.in_reply_to,
                    context: None,
                };
                match kind {
                    MediaKind::Image => ActivityObject::Image(media),
                    MediaKind::Video => ActivityObject::Video(media),
                    MediaKind::Document => ActivityObject::Document(media),
                }
            }
            (None, None, Some(text)) => ActivityObject::Note(Note {
                id: self.id,
                content: text,
                in_reply_to: self.in_reply_to,
                context: None,
            }),
            (None, None, None) => return Err(ParseError::Empty),
        };

        Ok(ActivityStream {
            context: ACTIVITY_STREAMS_CONTEXT.to_string(),
            kind: ActivityKind::Create,
            generator: self.ctx.generator().clone(),
            published,
            actor: self.actor,
            target: self.target,
            object,
        })
    }
}
