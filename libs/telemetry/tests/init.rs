//! Installs the global subscriber, so it runs in its own test binary.

use ash_telemetry::{TelemetryConfig, init_telemetry, install, telemetry_enabled};

#[test]
fn init_is_idempotent_and_tracks_metrics_flag() {
    let cfg = TelemetryConfig::from_lookup("ash-test", "0.0.0", |key| match key {
        "LOG_FORMAT" => Some("text".into()),
        "ENABLE_METRICS" => Some("on".into()),
        _ => None,
    });
    assert!(!cfg.json_logs);
    init_telemetry(cfg.clone()).unwrap();
    assert!(telemetry_enabled());

    let quiet = TelemetryConfig::from_lookup("ash-test", "0.0.0", |_| None);
    init_telemetry(quiet).unwrap();
    assert!(!telemetry_enabled());

    install("ash-telemetry-it").unwrap();
    tracing::info!("still logging after repeated installs");
}
