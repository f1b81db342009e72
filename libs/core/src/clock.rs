//! Time sources and platform timestamp conversions used to stamp `published`.

use std::fmt;

use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

/// Source of the wall-clock fallback for platforms that omit a timestamp.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl FixedClock {
    pub fn from_unix(secs: i64) -> Self {
        Self(OffsetDateTime::from_unix_timestamp(secs).unwrap_or(OffsetDateTime::UNIX_EPOCH))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Converts a millisecond epoch timestamp (Kik, Messenger).
///
/// ```
/// use ash_core::clock::{format_published, from_unix_millis};
///
/// let ts = from_unix_millis(1_700_000_000_123).unwrap();
/// assert_eq!(format_published(ts), "2023-11-14T22:13:20.123Z");
/// assert!(from_unix_millis(0).is_none());
/// ```
pub fn from_unix_millis(millis: i64) -> Option<OffsetDateTime> {
    if millis <= 0 {
        return None;
    }
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

/// Converts a Slack `ts` of the form `"<seconds>.<micros>"`.
///
/// ```
/// use ash_core::clock::{format_published, from_slack_ts};
///
/// let ts = from_slack_ts("1700000000.000100").unwrap();
/// assert_eq!(format_published(ts), "2023-11-14T22:13:20.0001Z");
/// assert!(from_slack_ts("not-a-ts").is_none());
/// ```
pub fn from_slack_ts(ts: &str) -> Option<OffsetDateTime> {
    let (secs, frac) = match ts.trim().split_once('.') {
        Some((secs, frac)) => (secs, frac),
        None => (ts.trim(), ""),
    };
    let secs: i64 = secs.parse().ok()?;
    if secs <= 0 {
        return None;
    }
    let micros: i64 = if frac.is_empty() {
        0
    } else {
        if !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        // right-pad to microsecond precision, dropping anything finer
        let padded: String = frac.chars().chain(std::iter::repeat('0')).take(6).collect();
        padded.parse().ok()?
    };
    let nanos = i128::from(secs) * 1_000_000_000 + i128::from(micros) * 1_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}

/// Formats an instant as RFC3339 in UTC.
pub fn format_published(ts: OffsetDateTime) -> String {
    ts.to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

pub fn parse_published(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slack_ts_without_fraction_is_whole_seconds() {
        let ts = from_slack_ts("1700000000").unwrap();
        assert_eq!(format_published(ts), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn slack_ts_rejects_garbage_fraction() {
        assert!(from_slack_ts("1700000000.12ab").is_none());
        assert!(from_slack_ts("-5.1").is_none());
        assert!(from_slack_ts("").is_none());
    }

    #[test]
    fn fixed_clock_is_stable() {
        let clock = FixedClock::from_unix(1_700_000_000);
        assert_eq!(clock.now(), clock.now());
        assert_eq!(format_published(clock.now()), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn published_round_trips() {
        let text = "2024-02-29T12:00:00.5Z";
        let parsed = parse_published(text).unwrap();
        assert_eq!(format_published(parsed), text);
    }
}
