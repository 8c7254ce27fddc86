//! Timestamp parsing and minute truncation
//!
//! Export timestamps look like `2025-11-07 12:34:56 -0700`. Some documents
//! omit the offset; those are treated as UTC.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Timelike};
use thiserror::Error;

/// Timestamp layout with a numeric UTC offset.
const FORMAT_WITH_OFFSET: &str = "%Y-%m-%d %H:%M:%S %z";
/// Timestamp layout without an offset, interpreted as UTC.
const FORMAT_NAIVE: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("unrecognized timestamp format: {0:?}")]
    Unrecognized(String),
}

/// Parse an export timestamp, preserving whatever offset it carries.
///
/// Accepts `YYYY-MM-DD HH:MM:SS ±HHMM` or the same pattern without an
/// offset (treated as UTC). Anything else is an error for that record.
pub fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
    if let Ok(ts) = DateTime::parse_from_str(text, FORMAT_WITH_OFFSET) {
        return Ok(ts);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, FORMAT_NAIVE) {
        return Ok(naive.and_utc().fixed_offset());
    }
    Err(TimestampError::Unrecognized(text.to_string()))
}

/// Truncate a timestamp to the start of its minute.
pub fn minute_floor(ts: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let seconds = i64::from(ts.second());
    let nanos = i64::from(ts.nanosecond() % 1_000_000_000);
    ts - Duration::seconds(seconds) - Duration::nanoseconds(nanos)
}
