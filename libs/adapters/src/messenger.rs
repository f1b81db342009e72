//! Messenger adapter: page webhooks in, Send API out.

use std::sync::Arc;

use ash_core::{ActivityStream, OutboundActivity, ParserContext, Platform, UserInfo};
use ash_translator::{MessengerParser, MessengerTranslator, Translator};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::adapter::response_id;
use crate::{
    Adapter, AdapterBase, AdapterError, AdapterEvent, AdapterStatus, MessengerConfig,
    SendReceipt, Transport, TransportRequest,
};

pub struct MessengerAdapter {
    config: MessengerConfig,
    base: AdapterBase,
    parser: MessengerParser,
    transport: Arc<dyn Transport>,
}

impl MessengerAdapter {
    pub fn new(config: MessengerConfig, transport: Arc<dyn Transport>) -> Self {
        let ctx = ParserContext::for_platform(Platform::Messenger, config.instance_id.clone());
        Self::with_context(config, ctx, transport)
    }

    pub fn with_context(
        config: MessengerConfig,
        ctx: ParserContext,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            base: AdapterBase::new(Platform::Messenger),
            parser: MessengerParser::new(ctx),
            transport,
        }
    }

    /// Checks `X-Hub-Signature-256` when an app secret is configured.
    pub fn verify_request(&self, signature: Option<&str>, body: &[u8]) -> Result<(), AdapterError> {
        match self.config.app_secret.as_deref() {
            Some(secret) => Ok(ash_security::verify_messenger(secret, signature, body)?),
            None => {
                tracing::debug!("messenger app secret not configured; skipping verification");
                Ok(())
            }
        }
    }

    /// Answers the webhook subscription handshake with the challenge to echo back.
    pub fn verify_subscription<'a>(
        &self,
        mode: Option<&str>,
        token: Option<&str>,
        challenge: Option<&'a str>,
    ) -> Result<&'a str, AdapterError> {
        let verify_token = self
            .config
            .verify_token
            .as_deref()
            .ok_or_else(|| AdapterError::Config("MESSENGER_VERIFY_TOKEN is not configured".into()))?;
        Ok(ash_security::verify_messenger_subscription(
            verify_token,
            mode,
            token,
            challenge,
        )?)
    }

    async fn deliver(&self, out: &OutboundActivity) -> Result<SendReceipt, AdapterError> {
        let payloads = MessengerTranslator
            .to_platform(out)
            .map_err(AdapterError::Translate)?;
        let url = format!("{}/me/messages", self.config.api_base.trim_end_matches('/'));
        let mut receipt = SendReceipt {
            message_id: None,
            raw: Vec::with_capacity(payloads.len()),
        };
        for payload in payloads {
            let request = TransportRequest::json(url.clone(), payload)
                .with_query("access_token", self.config.page_access_token.clone());
            let response = self.transport.deliver(request).await?;
            receipt.message_id = response_id(&response.body, "message_id").or(receipt.message_id);
            receipt.raw.push(response.body);
        }
        Ok(receipt)
    }
}

#[async_trait]
impl Adapter for MessengerAdapter {
    fn platform(&self) -> Platform {
        Platform::Messenger
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Payload, RecordingTransport, TransportResponse};
    use ash_core::testkit::fixed_context;
    use ash_testutil::load_fixture;
    use serde_json::json;

    fn adapter(transport: Arc<RecordingTransport>) -> MessengerAdapter {
        let config = MessengerConfig {
            page_access_token: "page-token".into(),
            app_secret: None,
            verify_token: Some("verify-me".into()),
            api_base: "https://graph.test/v18.0".into(),
            instance_id: "messenger-test".into(),
        };
        MessengerAdapter::with_context(config, fixed_context(Platform::Messenger), transport)
    }

    #[tokio::test]
    async fn echo_is_ignored_without_event() {
        let adapter = adapter(Arc::new(RecordingTransport::new()));
        adapter.connect().await.unwrap();
        let mut rx = adapter.listen().await;
        let activities = adapter
            .handle_delivery(&load_fixture("messenger", "echo"), None)
            .await
            .unwrap();
        assert!(activities.is_empty());
        adapter.disconnect().await.unwrap();
        assert!(matches!(rx.recv().await, Some(AdapterEvent::Disconnected { .. })));
    }

    #[tokio::test]
    async fn send_passes_access_token_as_query() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_with(Ok(TransportResponse::ok(
            json!({ "recipient_id": "USER_PSID", "message_id": "m_AG5Hz2U" }),
        )));
        let adapter = adapter(transport.clone());
        adapter.connect().await.unwrap();
        let receipt = adapter
            .send(&json!({ "target": { "id": "USER_PSID" }, "object": { "type": "Note", "content": "hey" } }))
            .await
            .unwrap();
        assert_eq!(receipt.message_id.as_deref(), Some("m_AG5Hz2U"));
        let requests = transport.requests();
        assert_eq!(requests[0].url, "https://graph.test/v18.0/me/messages");
        assert_eq!(
            requests[0].query,
            vec![("access_token".to_string(), "page-token".to_string())]
        );
    }

    #[tokio::test]
    async fn reply_is_addressed_to_the_user_not_the_page() {
        let transport = Arc::new(RecordingTransport::new());
        let adapter = adapter(transport.clone());
        adapter.connect().await.unwrap();
        let activities = adapter
            .handle_delivery(&load_fixture("messenger", "text"), None)
            .await
            .unwrap();
        adapter.send_activity(&activities[0]).await.unwrap();

        match &transport.requests()[0].payload {
            Payload::Json(body) => {
                assert_eq!(body["recipient"]["id"], "USER_PSID");
                assert_eq!(body["message"]["text"], "hello, world!");
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn subscription_handshake_echoes_challenge() {
        let adapter = adapter(Arc::new(RecordingTransport::new()));
        assert_eq!(
            adapter
                .verify_subscription(Some("subscribe"), Some("verify-me"), Some("42"))
                .unwrap(),
            "42"
        );
        assert!(adapter.verify_request(None, b"{}").is_ok());
    }
}
