//! SMS adapter over Twilio Programmable Messaging.

use std::sync::Arc;

use ash_core::{ActivityStream, OutboundActivity, ParserContext, Platform, UserInfo};
use ash_translator::{SmsParser, SmsTranslator, Translator};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::adapter::response_id;
use crate::{
    Adapter, AdapterBase, AdapterError, AdapterEvent, AdapterStatus, Auth, SendReceipt,
    SmsConfig, Transport, TransportRequest,
};

pub struct SmsAdapter {
    config: SmsConfig,
    base: AdapterBase,
    parser: SmsParser,
    translator: SmsTranslator,
    transport: Arc<dyn Transport>,
}

impl SmsAdapter {
    pub fn new(config: SmsConfig, transport: Arc<dyn Transport>) -> Self {
        let ctx = ParserContext::for_platform(Platform::Sms, config.instance_id.clone());
        Self::with_context(config, ctx, transport)
    }

    pub fn with_context(config: SmsConfig, ctx: ParserContext, transport: Arc<dyn Transport>) -> Self {
        Self {
            translator: SmsTranslator::new(config.from_number.clone()),
            config,
            base: AdapterBase::new(Platform::Sms),
            parser: SmsParser::new(ctx),
            transport,
        }
    }

    /// Checks `X-Twilio-Signature` for a webhook posted to `url` with form `params`.
    pub fn verify_request(
        &self,
        url: &str,
        params: &[(&str, &str)],
        signature: Option<&str>,
    ) -> Result<(), AdapterError> {
        Ok(ash_security::verify_twilio(&self.config.auth_token, url, params, signature)?)
    }

    async fn deliver(&self, out: &OutboundActivity) -> Result<SendReceipt, AdapterError> {
        let payloads = self.translator.to_platform(out).map_err(AdapterError::Translate)?;
        let url = format!(
            "{}/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        );
        let mut receipt = SendReceipt {
            message_id: None,
            raw: Vec::with_capacity(payloads.len()),
        };
        for payload in payloads {
            let request = TransportRequest::form(url.clone(), form_fields(&payload)).with_auth(
                Auth::Basic {
                    username: self.config.account_sid.clone(),
                    password: self.config.auth_token.clone(),
                },
            );
            let response = self.transport.deliver(request).await?;
            receipt.message_id = response_id(&response.body, "sid").or(receipt.message_id);
            receipt.raw.push(response.body);
        }
        Ok(receipt)
    }
}

/// Flattens a JSON object of strings into form fields, keeping key order.
fn form_fields(payload: &Value) -> Vec<(String, String)> {
    payload
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|(key, value)| value.as_str().map(|v| (key.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl Adapter for SmsAdapter {
    fn platform(&self) -> Platform {
        Platform::Sms
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
