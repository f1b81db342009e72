use std::fmt::Debug;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::clock::{Clock, SystemClock};
use crate::error::{ParseError, ValidationError};
use crate::types::{ActivityStream, Generator, Platform, UserInfo};
use crate::validate::validate_activity;

/// Generator identity and time source shared by a parser instance.
#[derive(Debug, Clone)]
pub struct ParserContext {
    generator: Generator,
    clock: Arc<dyn Clock>,
}

impl ParserContext {
    pub fn new(generator: Generator, clock: Arc<dyn Clock>) -> Self {
        Self { generator, clock }
    }

    /// Context for `platform` backed by the system clock.
    pub fn for_platform(platform: Platform, instance_id: impl Into<String>) -> Self {
        Self::new(Generator::new(platform, instance_id), Arc::new(SystemClock))
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }
}

/// Result of running one raw event through the full pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Activity(Box<ActivityStream>),
    /// Not a user message (typing indicators, receipts, bot echoes, ...).
    Ignored,
    Rejected(ValidationError),
}

/// Maps one platform's payloads into validated activities.
///
/// The three stages are kept separate so adapters and tests can observe the
/// intermediate normalized shape.
pub trait Parser: Send + Sync {
    type Normalized: Debug + Clone + Serialize + Send + Sync;

    fn platform(&self) -> Platform;

    fn context(&self) -> &ParserContext;

    /// Splits a webhook delivery into individual events. Platforms that batch
    /// (Kik, Messenger) override this.
    fn events(&self, raw: &Value) -> Vec<Value> {
        vec![raw.clone()]
    }

    /// Extracts platform fields. `Ok(None)` means the event is not a message.
    fn normalize(
        &self,
        raw: &Value,
        user: Option<&UserInfo>,
    ) -> Result<Option<Self::Normalized>, ParseError>;

    fn parse(&self, msg: &Self::Normalized) -> Result<ActivityStream, ParseError>;

    fn check(&self, activity: &ActivityStream) -> Result<(), ValidationError> {
        validate_activity(activity)
    }

    /// Returns the activity when it passes [`Parser::check`], `None` otherwise.
    fn validate(&self, activity: ActivityStream) -> Option<ActivityStream> {
        match self.check(&activity) {
            Ok(()) => Some(activity),
            Err(err) => {
                tracing::warn!(
                    platform = %self.platform(),
                    object_id = %activity.object.id(),
                    reason = %err,
                    "activity failed validation"
                );
                None
            }
        }
    }

    /// normalize → parse → validate for a single event.
    fn process(&self, raw: &Value, user: Option<&UserInfo>) -> Result<Outcome, ParseError> {
        let Some(normalized) = self.normalize(raw, user)? else {
            tracing::debug!(platform = %self.platform(), "event ignored");
            return Ok(Outcome::Ignored);
        };
        let activity = self.parse(&normalized)?;
        match self.check(&activity) {
            Ok(()) => Ok(Outcome::Activity(Box::new(activity))),
            Err(err) => {
                tracing::warn!(
                    platform = %self.platform(),
                    object_id = %activity.object.id(),
                    reason = %err,
                    "activity rejected"
                );
                Ok(Outcome::Rejected(err))
            }
        }
    }
}
