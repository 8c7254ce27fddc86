//! Per-minute, per-source share accumulation
//!
//! Owned by the pipeline during ingestion and read once, in full, by the
//! aggregation step afterwards. Memory footprint is bounded by
//! (distinct minutes touched) x (distinct sources per minute) — the primary
//! scaling constraint for very large inputs.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};

/// Map from minute slot to source name to accumulated share.
///
/// Minute keys compare and hash by instant, so two offset-spellings of the
/// same moment land in one bucket and keep the first-inserted key's offset.
#[derive(Debug, Default)]
pub struct MinuteAccumulator {
    minutes: HashMap<DateTime<FixedOffset>, HashMap<String, f64>>,
}

impl MinuteAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `source`'s running total for `minute`.
    ///
    /// Creates the minute's source map on first use; the same source in the
    /// same minute accumulates additively. `amount` is finite and
    /// non-negative by the apportioner's contract.
    pub fn add(&mut self, minute: DateTime<FixedOffset>, source: &str, amount: f64) {
        let by_source = self.minutes.entry(minute).or_default();
        *by_source.entry(source.to_string()).or_default() += amount;
    }

    /// Minute -> source -> accumulated share, in no particular order.
    /// Ordering is imposed later, by the daily aggregation.
    pub fn minutes(&self) -> &HashMap<DateTime<FixedOffset>, HashMap<String, f64>> {
        &self.minutes
    }

    /// Number of distinct minutes touched
    pub fn len(&self) -> usize {
        self.minutes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }
}
