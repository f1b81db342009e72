use std::future::Future;
use std::sync::Mutex;

use ash_core::{
    ActivityStream, OutboundActivity, Outcome, Parser, Platform, UserInfo, ValidationError,
};
use ash_telemetry::{TelemetryLabels, record_counter, with_common_fields};
use ash_translator::telemetry::parse_with_span;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{RwLock, mpsc};
use tracing::Instrument;

use crate::AdapterError;

const EVENT_BUFFER: usize = 64;
const SEND_SPAN_NAME: &str = "send.run";
const SENT_COUNTER: &str = "activities_sent";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    Connected { platform: Platform },
    Disconnected { platform: Platform, reason: String },
    Activity(Box<ActivityStream>),
    Rejected { platform: Platform, reason: ValidationError },
}

/// What the platform answered for an outbound activity.
#[derive(Debug, Clone, PartialEq)]
pub struct SendReceipt {
    /// Platform id of the last delivered message, when the API returns one.
    pub message_id: Option<String>,
    /// One response body per platform request.
    pub raw: Vec<Value>,
}

#[async_trait]
pub trait Adapter: Send + Sync {
    fn platform(&self) -> Platform;

    fn status(&self) -> AdapterStatus;

    /// Marks the adapter running and emits [`AdapterEvent::Connected`]. Calling it again
    /// while running is a no-op.
    async fn connect(&self) -> Result<(), AdapterError>;

    /// Opens the event stream. A second call replaces (and closes) the previous one.
    async fn listen(&self) -> mpsc::Receiver<AdapterEvent>;

    /// Runs one raw platform event through normalize, parse and validate.
    ///
    /// Returns the emitted activity; `Ok(None)` for ignored events and for activities that
    /// failed validation (those emit [`AdapterEvent::Rejected`]).
    async fn handle_event(
        &self,
        raw: &Value,
        user: Option<&UserInfo>,
    ) -> Result<Option<ActivityStream>, AdapterError>;

    /// Splits a webhook delivery into events and handles each one.
    async fn handle_delivery(
        &self,
        raw: &Value,
        user: Option<&UserInfo>,
    ) -> Result<Vec<ActivityStream>, AdapterError>;

    /// Validates an outbound activity, builds platform payloads and delivers them.
    async fn send(&self, activity: &Value) -> Result<SendReceipt, AdapterError>;

    /// Answers an inbound activity with its own object, addressed per
    /// [`OutboundActivity::reply_to`].
    async fn send_activity(&self, activity: &ActivityStream) -> Result<SendReceipt, AdapterError> {
        let out = OutboundActivity::reply_to(activity);
        let value = serde_json::to_value(&out)
            .map_err(|err| AdapterError::Invalid(ValidationError::Malformed(err.to_string())))?;
        self.send(&value).await
    }

    async fn disconnect(&self) -> Result<(), AdapterError>;
}

/// Lifecycle state and event channel shared by every platform adapter.
#[derive(Debug)]
pub struct AdapterBase {
    platform: Platform,
    status: Mutex<AdapterStatus>,
    events: RwLock<Option<mpsc::Sender<AdapterEvent>>>,
}

impl AdapterBase {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            status: Mutex::new(AdapterStatus::Stopped),
            events: RwLock::new(None),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn status(&self) -> AdapterStatus {
        *self
            .status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_status(&self, status: AdapterStatus) {
        *self
            .status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = status;
    }

    pub fn is_running(&self) -> bool {
        self.status() == AdapterStatus::Running
    }

    pub fn ensure_running(&self) -> Result<(), AdapterError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(AdapterError::NotRunning(self.platform))
        }
    }

    pub async fn listen(&self) -> mpsc::Receiver<AdapterEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        *self.events.write().await = Some(tx);
        tracing::debug!(platform = %self.platform, "listener attached");
        rx
    }

    async fn emit(&self, event: AdapterEvent) {
        let sender = self.events.read().await.clone();
        match sender {
            Some(tx) => {
                if tx.send(event).await.is_err() {
                    tracing::debug!(platform = %self.platform, "listener dropped; event discarded");
                }
            }
            None => tracing::debug!(platform = %self.platform, "no listener; event discarded"),
        }
    }

    pub async fn connect(&self) {
        if self.is_running() {
            return;
        }
        self.set_status(AdapterStatus::Starting);
        self.set_status(AdapterStatus::Running);
        tracing::info!(platform = %self.platform, "adapter connected");
        self.emit(AdapterEvent::Connected {
            platform: self.platform,
        })
        .await;
    }

    pub async fn disconnect(&self, reason: &str) {
        if self.status() == AdapterStatus::Stopped {
            return;
        }
        self.set_status(AdapterStatus::Stopping);
        self.emit(AdapterEvent::Disconnected {
            platform: self.platform,
            reason: reason.to_string(),
        })
        .await;
        *self.events.write().await = None;
        self.set_status(AdapterStatus::Stopped);
        tracing::info!(platform = %self.platform, reason, "adapter disconnected");
    }

    /// Runs `parser` on one event and emits the outcome.
    pub async fn handle_event<P: Parser>(
        &self,
        parser: &P,
        raw: &Value,
        user: Option<&UserInfo>,
    ) -> Result<Option<ActivityStream>, AdapterError> {
        self.ensure_running()?;
        match parse_with_span(self.platform, || parser.process(raw, user))? {
            Outcome::Activity(activity) => {
                self.emit(AdapterEvent::Activity(activity.clone())).await;
                Ok(Some(*activity))
            }
            Outcome::Ignored => Ok(None),
            Outcome::Rejected(reason) => {
                self.emit(AdapterEvent::Rejected {
                    platform: self.platform,
                    reason,
                })
                .await;
                Ok(None)
            }
        }
    }

    pub async fn handle_delivery<P: Parser>(
        &self,
        parser: &P,
        raw: &Value,
        user: Option<&UserInfo>,
    ) -> Result<Vec<ActivityStream>, AdapterError> {
        let mut activities = Vec::new();
        for event in parser.events(raw) {
            if let Some(activity) = self.handle_event(parser, &event, user).await? {
                activities.push(activity);
            }
        }
        Ok(activities)
    }

    /// Runs a delivery inside a `send.run` span and counts the activity once it succeeds.
    pub async fn send_with_span<F>(&self, target: &str, fut: F) -> Result<SendReceipt, AdapterError>
    where
        F: Future<Output = Result<SendReceipt, AdapterError>> + Send,
    {
        let span = tracing::info_span!(
            SEND_SPAN_NAME,
            platform = tracing::field::Empty,
            channel = tracing::field::Empty,
            msg_id = tracing::field::Empty,
        );
        with_common_fields(&span, self.platform.as_str(), Some(target), None);
        let result = fut.instrument(span.clone()).await;
        let labels = TelemetryLabels::new(self.platform.as_str());
        match &result {
            Ok(receipt) => {
                if let Some(id) = &receipt.message_id {
                    span.record("msg_id", tracing::field::display(id));
                }
                record_counter(SENT_COUNTER, 1, &labels);
            }
            Err(err) => {
                let _guard = span.enter();
                tracing::warn!(error = %err, "delivery failed");
            }
        }
        result
    }
}

/// String field of a platform response, used to pick message ids out of API answers.
pub(crate) fn response_id(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
