//! Helpers for tests that need deterministic parser contexts.

use std::sync::Arc;

use crate::clock::FixedClock;
use crate::parser::ParserContext;
use crate::types::{Generator, Platform};

/// Instant used by [`fixed_context`]: 2023-11-14T22:13:20Z.
pub const FIXED_NOW_UNIX: i64 = 1_700_000_000;

/// Parser context with a frozen clock and a predictable instance id (`<platform>-test`).
pub fn fixed_context(platform: Platform) -> ParserContext {
    ParserContext::new(
        Generator::new(platform, format!("{}-test", platform.as_str())),
        Arc::new(FixedClock::from_unix(FIXED_NOW_UNIX)),
    )
}
