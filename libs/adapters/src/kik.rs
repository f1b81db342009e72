//! Kik adapter: webhook deliveries in, `/v1/message` out.

use std::sync::Arc;

use ash_core::{ActivityStream, OutboundActivity, ParserContext, Platform, UserInfo};
use ash_translator::{KikParser, KikTranslator, Translator};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    Adapter, AdapterBase, AdapterError, AdapterEvent, AdapterStatus, Auth, KikConfig,
    SendReceipt, Transport, TransportRequest,
};

pub struct KikAdapter {
    config: KikConfig,
    base: AdapterBase,
    parser: KikParser,
    transport: Arc<dyn Transport>,
}

impl KikAdapter {
    pub fn new(config: KikConfig, transport: Arc<dyn Transport>) -> Self {
        let ctx = ParserContext::for_platform(Platform::Kik, config.instance_id.clone());
        Self::with_context(config, ctx, transport)
    }

    pub fn with_context(config: KikConfig, ctx: ParserContext, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            base: AdapterBase::new(Platform::Kik),
            parser: KikParser::new(ctx),
            transport,
        }
    }

    /// Checks that `X-Kik-Username` names the configured bot.
    pub fn verify_request(&self, username_header: Option<&str>) -> Result<(), AdapterError> {
        Ok(ash_security::verify_kik_username(&self.config.username, username_header)?)
    }

    async fn deliver(&self, out: &OutboundActivity) -> Result<SendReceipt, AdapterError> {
        let payloads = KikTranslator.to_platform(out).map_err(AdapterError::Translate)?;
        let url = format!("{}/v1/message", self.config.api_base.trim_end_matches('/'));
        let mut raw = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let request = TransportRequest::json(url.clone(), payload).with_auth(Auth::Basic {
                username: self.config.username.clone(),
                password: self.config.api_key.clone(),
            });
            raw.push(self.transport.deliver(request).await?.body);
        }
        // Kik acknowledges with an empty body; there is no message id to hand back.
        Ok(SendReceipt {
            message_id: None,
            raw,
        })
    }
}

#[async_trait]
impl Adapter for KikAdapter {
    fn platform(&self) -> Platform {
        Platform::Kik
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
