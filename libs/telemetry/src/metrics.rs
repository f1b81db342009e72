use std::sync::atomic::{AtomicBool, Ordering};

use metrics::Label;
use tracing::Span;

use crate::context::TelemetryLabels;

static TELEMETRY_ENABLED: AtomicBool = AtomicBool::new(false);

pub fn telemetry_enabled() -> bool {
    TELEMETRY_ENABLED.load(Ordering::SeqCst)
}

pub fn set_telemetry_enabled(enabled: bool) {
    TELEMETRY_ENABLED.store(enabled, Ordering::SeqCst);
}

pub fn with_common_fields(span: &Span, platform: &str, channel: Option<&str>, msg_id: Option<&str>) {
    span.record("platform", tracing::field::display(platform));
    if let Some(channel) = channel {
        span.record("channel", tracing::field::display(channel));
    }
    if let Some(msg_id) = msg_id {
        span.record("msg_id", tracing::field::display(msg_id));
    }
}

fn labels(labels: &TelemetryLabels) -> Vec<Label> {
    labels
        .tags()
        .into_iter()
        .map(|(key, value)| Label::new(key, value))
        .collect()
}

pub fn record_counter(name: &'static str, value: u64, labels_in: &TelemetryLabels) {
    if !telemetry_enabled() {
        return;
    }
    metrics::counter!(name, labels(labels_in)).increment(value);
}

pub fn record_histogram(name: &'static str, value: f64, labels_in: &TelemetryLabels) {
    if !telemetry_enabled() {
        return;
    }
    metrics::histogram!(name, labels(labels_in)).record(value);
}

pub fn record_gauge(name: &'static str, value: f64, labels_in: &TelemetryLabels) {
    if !telemetry_enabled() {
        return;
    }
    metrics::gauge!(name, labels(labels_in)).set(value);
}
