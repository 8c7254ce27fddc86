//! Input record types: the verbatim raw form and the validated measurement

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timeparse::{self, TimestampError};

/// One input record exactly as received, every field verbatim text.
///
/// The raw passthrough output echoes these fields unmodified, whether or not
/// the record is eligible for apportionment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub start_date: String,
    pub end_date: String,
    pub creation_date: String,
    pub value: String,
    pub unit: String,
    pub source_name: String,
    pub source_version: String,
    pub device: String,
}

/// Why a record is ineligible for apportionment.
///
/// None of these is fatal: the record still reaches the raw passthrough, it
/// just contributes nothing to the totals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("bad timestamp: {0}")]
    Timestamp(#[from] TimestampError),
    #[error("interval end is not after start")]
    DegenerateInterval,
    #[error("value is not a positive finite number")]
    NonPositiveValue,
}

/// A record validated for apportionment: parsed interval, positive value,
/// reporting source.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub value: f64,
    pub source: String,
}

impl Measurement {
    /// Validate a raw record for apportionment.
    ///
    /// Value text that fails to parse counts as zero, which then fails the
    /// positive-value requirement. `creation_date`, `unit`, `source_version`
    /// and `device` play no part in the totals.
    pub fn from_raw(raw: &RawRecord) -> Result<Self, RecordError> {
        let start = timeparse::parse_timestamp(&raw.start_date)?;
        let end = timeparse::parse_timestamp(&raw.end_date)?;
        let value: f64 = raw.value.parse().unwrap_or(0.0);

        if end <= start {
            return Err(RecordError::DegenerateInterval);
        }
        if value <= 0.0 || !value.is_finite() {
            return Err(RecordError::NonPositiveValue);
        }

        Ok(Self {
            start,
            end,
            value,
            source: raw.source_name.clone(),
        })
    }
}
