use ash_core::{Outcome, ParseError, Platform};
use ash_telemetry::{MessageContext, TelemetryLabels, record_counter, with_common_fields};

const PARSE_SPAN_NAME: &str = "parse.run";
const TRANSLATE_SPAN_NAME: &str = "translate.run";
const PARSED_COUNTER: &str = "activities_parsed";
const REJECTED_COUNTER: &str = "activities_rejected";
const TRANSLATED_COUNTER: &str = "activities_translated";

/// Runs an inbound pipeline inside a `parse.run` span and records the outcome.
pub fn parse_with_span<F>(platform: Platform, f: F) -> Result<Outcome, ParseError>
where
    F: FnOnce() -> Result<Outcome, ParseError>,
{
    let span = tracing::info_span!(
        PARSE_SPAN_NAME,
        platform = tracing::field::Empty,
        channel = tracing::field::Empty,
        msg_id = tracing::field::Empty,
    );
    with_common_fields(&span, platform.as_str(), None, None);
    let _guard = span.enter();

    let result = f();
    let labels = TelemetryLabels::new(platform.as_str());
    match &result {
        Ok(Outcome::Activity(activity)) => {
            span.record("channel", tracing::field::display(&activity.target.id));
            span.record("msg_id", tracing::field::display(activity.object.id()));
            tracing::debug!(kind = activity.object.kind(), "activity parsed");
            let labels = labels.with_extra("kind", activity.object.kind());
            record_counter(PARSED_COUNTER, 1, &labels);
        }
        Ok(Outcome::Rejected(reason)) => {
            let labels = labels.with_extra("reason", "validation");
            tracing::debug!(%reason, "activity rejected");
            record_counter(REJECTED_COUNTER, 1, &labels);
        }
        Ok(Outcome::Ignored) => {}
        Err(err) => {
            tracing::warn!(error = %err, "payload could not be parsed");
            let labels = labels.with_extra("reason", "parse");
            record_counter(REJECTED_COUNTER, 1, &labels);
        }
    }
    result
}

/// Runs an outbound translation inside a `translate.run` span.
pub fn translate_with_span<T, F>(platform: Platform, target: &str, f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    let labels = TelemetryLabels::new(platform.as_str()).with_channel(target);
    let ctx = MessageContext::new(labels.clone());
    let span = tracing::info_span!(
        TRANSLATE_SPAN_NAME,
        platform = tracing::field::Empty,
        channel = tracing::field::Empty,
        msg_id = tracing::field::Empty,
    );
    with_common_fields(
        &span,
        &ctx.labels.platform,
        ctx.labels.channel.as_deref(),
        ctx.labels.msg_id.as_deref(),
    );
    let _guard = span.enter();
    let result = f();
    if result.is_ok() {
        record_counter(TRANSLATED_COUNTER, 1, &labels);
    }
    result
}
