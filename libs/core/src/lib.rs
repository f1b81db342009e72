//! Activity hub core contracts and value types.
//!
//! This crate exposes the Activity Streams envelope every adapter emits, the
//! [`Parser`] pipeline contract (normalize → parse → validate), the kind-selection
//! builder shared by platform parsers, and validation helpers for inbound and
//! outbound activities.
pub mod builder;
pub mod clock;
pub mod error;
pub mod outbound;
pub mod parser;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
pub mod types;
pub mod validate;

pub use builder::{ActivityBuilder, Attachment, Callback, MediaKind};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ParseError, ValidationError};
pub use outbound::{OutboundActivity, OutboundMedia, OutboundObject};
pub use parser::{Outcome, Parser, ParserContext};
pub use types::*;
pub use validate::{validate_activity, validate_outbound};

/// Returns the semantic version advertised by this crate.
///
/// ```
/// assert_eq!(ash_core::version(), env!("CARGO_PKG_VERSION"));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
