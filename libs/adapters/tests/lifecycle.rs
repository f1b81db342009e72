use std::sync::{Arc, Mutex};

use ash_adapters::{
    Adapter, AdapterEvent, AdapterStatus, Payload, SlackAdapter, SlackConfig, SmsAdapter,
    SmsConfig, Transport, TransportError, TransportRequest, TransportResponse,
};
use ash_core::testkit::fixed_context;
use ash_core::{Platform, ValidationError};
use ash_testutil::load_fixture;
use async_trait::async_trait;
use serde_json::{Value, json};

/// Answers every call with a fixed body and keeps the request bodies.
#[derive(Default)]
struct StubTransport {
    body: Value,
    sent: Mutex<Vec<Payload>>,
}

#[async_trait]
impl Transport for StubTransport {
    async fn deliver(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.sent.lock().unwrap().push(request.payload);
        Ok(TransportResponse::ok(self.body.clone()))
    }
}

fn slack(transport: Arc<StubTransport>) -> SlackAdapter {
    let config = SlackConfig {
        bot_token: "xoxb-it".into(),
        signing_secret: None,
        api_base: "https://slack.test/api".into(),
        instance_id: "it".into(),
    };
    SlackAdapter::with_context(config, fixed_context(Platform::Slack), transport)
}

#[tokio::test]
async fn slack_round_trip_through_trait_object() {
    let transport = Arc::new(StubTransport {
        body: json!({ "ok": true, "ts": "1700000500.000001" }),
        ..Default::default()
    });
    let adapter: Box<dyn Adapter> = Box::new(slack(transport.clone()));
    assert_eq!(adapter.status(), AdapterStatus::Stopped);

    let mut events = adapter.listen().await;
    adapter.connect().await.unwrap();
    let activity = adapter
        .handle_event(&load_fixture("slack", "message_text"), None)
        .await
        .unwrap()
        .expect("activity");

    let receipt = adapter.send_activity(&activity).await.unwrap();
    assert_eq!(receipt.message_id.as_deref(), Some("1700000500.000001"));
    let sent = transport.sent.lock().unwrap().clone();
    match &sent[..] {
        [Payload::Json(body)] => {
            assert_eq!(body["channel"], "C024BE91L");
            assert_eq!(body["thread_ts"], "1699999990.000200");
        }
        other => panic!("unexpected payloads {other:?}"),
    }

    adapter.disconnect().await.unwrap();
    assert_eq!(adapter.status(), AdapterStatus::Stopped);

    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        seen.push(event);
    }
    assert!(matches!(seen[0], AdapterEvent::Connected { platform: Platform::Slack }));
    assert!(matches!(seen[1], AdapterEvent::Activity(_)));
    assert!(matches!(seen[2], AdapterEvent::Disconnected { .. }));
    assert_eq!(seen.len(), 3);
}

#[tokio::test]
async fn invalid_activity_is_reported_as_rejected_event() {
    let config = SmsConfig {
        account_sid: "AC1".into(),
        auth_token: "t".into(),
        from_number: "+1".into(),
        api_base: "https://twilio.test".into(),
        instance_id: "it".into(),
    };
    let adapter = SmsAdapter::with_context(
        config,
        fixed_context(Platform::Sms),
        Arc::new(StubTransport::default()),
    );
    let mut events = adapter.listen().await;
    adapter.connect().await.unwrap();

    let raw = json!({
        "MessageSid": "MM1",
        "From": "+15550001111",
        "To": "+15557770000",
        "NumMedia": "1",
        "MediaUrl0": "ftp://media.example.com/ME1",
        "MediaContentType0": "image/png"
    });
    assert_eq!(adapter.handle_event(&raw, None).await.unwrap(), None);

    assert!(matches!(events.recv().await, Some(AdapterEvent::Connected { .. })));
    match events.recv().await {
        Some(AdapterEvent::Rejected { platform, reason }) => {
            assert_eq!(platform, Platform::Sms);
            assert!(matches!(reason, ValidationError::InvalidUrl { .. }));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn outbound_without_target_fails_schema() {
    let adapter = slack(Arc::new(StubTransport::default()));
    adapter.connect().await.unwrap();
    let err = adapter
        .send(&json!({ "object": { "type": "Note", "content": "orphan" } }))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("outbound activity rejected"));
}
