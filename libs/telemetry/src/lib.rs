//! Lightweight helpers for activity hub telemetry.
//! Provides subscriber installation, span utilities, metric recorders, and
//! message-context helpers shared by the translator and adapter crates.

mod config;
mod context;
mod init;
mod metrics;

pub use config::TelemetryConfig;
pub use context::{MessageContext, TelemetryLabels};
pub use init::{init_telemetry, install};
pub use metrics::{
    record_counter, record_gauge, record_histogram, set_telemetry_enabled, telemetry_enabled,
    with_common_fields,
};
