//! Slack adapter: Events API in, `chat.postMessage` out.

use std::sync::Arc;

use ash_core::{ActivityStream, OutboundActivity, ParserContext, Platform, UserInfo};
use ash_translator::{SlackParser, SlackTranslator, Translator};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::adapter::response_id;
use crate::{
    Adapter, AdapterBase, AdapterError, AdapterEvent, AdapterStatus, Auth, SendReceipt,
    SlackConfig, Transport, TransportError, TransportRequest,
};

pub struct SlackAdapter {
    config: SlackConfig,
    base: AdapterBase,
    parser: SlackParser,
    transport: Arc<dyn Transport>,
}

impl SlackAdapter {
    pub fn new(config: SlackConfig, transport: Arc<dyn Transport>) -> Self {
        let ctx = ParserContext::for_platform(Platform::Slack, config.instance_id.clone());
        Self::with_context(config, ctx, transport)
    }

    /// Builds the adapter around an explicit parser context (custom clock or generator).
    pub fn with_context(
        config: SlackConfig,
        ctx: ParserContext,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            base: AdapterBase::new(Platform::Slack),
            parser: SlackParser::new(ctx),
            transport,
        }
    }

    /// Checks `X-Slack-Signature` when a signing secret is configured.
    pub fn verify_request(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), AdapterError> {
        match self.config.signing_secret.as_deref() {
            Some(secret) => Ok(ash_security::verify_slack(secret, timestamp, signature, body)?),
            None => {
                tracing::debug!("slack signing secret not configured; skipping verification");
                Ok(())
            }
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat.postMessage", self.config.api_base.trim_end_matches('/'))
    }

    async fn deliver(&self, out: &OutboundActivity) -> Result<SendReceipt, AdapterError> {
        let payloads = SlackTranslator
            .to_platform(out)
            .map_err(AdapterError::Translate)?;
        let mut receipt = SendReceipt {
            message_id: None,
            raw: Vec::with_capacity(payloads.len()),
        };
        for payload in payloads {
            let request = TransportRequest::json(self.endpoint(), payload)
                .with_auth(Auth::Bearer(self.config.bot_token.clone()));
            let response = self.transport.deliver(request).await?;
            // Web API reports failures with HTTP 200 and `ok: false`.
            if response.body.get("ok").and_then(Value::as_bool) != Some(true) {
                let code = response
                    .body
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                return Err(TransportError::Api { code }.into());
            }
            receipt.message_id = response_id(&response.body, "ts").or(receipt.message_id);
            receipt.raw.push(response.body);
        }
        Ok(receipt)
    }
}

#[async_trait]
impl Adapter for SlackAdapter {
    fn platform(&self) -> Platform {
        Platform::Slack
    }

    fn status(&self) -> AdapterStatus {
        self.base.status()
    }

    async fn connect(&self) -> Result<(), AdapterError> {
        self.base.connect().await;
        Ok(())
    }

    async fn listen(&self) -> mpsc::Receiver<AdapterEvent> {
        self.base.listen().await
    }

    async fn handle_event(
        &self,
        raw: &Value,
        user: Option<&UserInfo>,
    ) -> Result<Option<ActivityStream>, AdapterError> {
        self.base.handle_event(&self.parser, raw, user).await
    }

    async fn handle_delivery(
        &self,
        raw: &Value,
        user: Option<&UserInfo>,
    ) -> Result<Vec<ActivityStream>, AdapterError> {
        self.base.handle_delivery(&self.parser, raw, user).await
    }

    async fn send(&self, activity: &Value) -> Result<SendReceipt, AdapterError> {
        self.base.ensure_running()?;
        let out = OutboundActivity::from_value(activity)?;
        self.base
            .send_with_span(&out.target.id, self.deliver(&out))
            .await
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        self.base.disconnect("adapter stopped").await;
        Ok(())
    }
}
