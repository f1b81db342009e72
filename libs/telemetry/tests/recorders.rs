//! Flips the process-wide metrics flag, so it runs in its own test binary.

use ash_telemetry::{
    TelemetryLabels, record_counter, record_gauge, record_histogram, set_telemetry_enabled,
    telemetry_enabled,
};

#[test]
fn enabled_recorders_tolerate_missing_recorder() {
    let labels = TelemetryLabels::new("kik").with_channel("chat-1");
    set_telemetry_enabled(true);
    assert!(telemetry_enabled());
    record_counter("activities_parsed", 1, &labels);
    record_histogram("send_latency_ms", 12.5, &labels);
    record_gauge("listeners", 1.0, &labels);
    set_telemetry_enabled(false);
    assert!(!telemetry_enabled());
}
