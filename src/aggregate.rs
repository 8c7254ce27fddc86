//! Daily aggregation: resolve each minute to one source, sum by calendar day

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::accumulator::MinuteAccumulator;
use crate::resolver::SourcePriority;

/// De-duplicated per-day totals, built once and immutable afterwards.
/// Iteration is ascending by date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyTotals {
    days: BTreeMap<NaiveDate, u64>,
}

impl DailyTotals {
    /// Total for one date, if any minute contributed to it
    pub fn get(&self, day: NaiveDate) -> Option<u64> {
        self.days.get(&day).copied()
    }

    /// (date, total) pairs in ascending date order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u64)> + '_ {
        self.days.iter().map(|(day, total)| (*day, *total))
    }

    /// Number of dates with at least one contributing minute
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Collapse the per-minute source maps into per-day totals.
///
/// For every minute: resolve the winning source, round its accumulated value
/// half-to-even, and add the result to the minute's own calendar date — the
/// date in whatever offset the minute's timestamp carries, no conversion.
/// Each minute contributes exactly one source's value, never a sum across
/// sources.
pub fn aggregate(acc: &MinuteAccumulator, priority: &SourcePriority) -> DailyTotals {
    let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();

    for (minute, by_source) in acc.minutes() {
        let Some(winner) = priority.resolve(by_source.keys().map(String::as_str)) else {
            continue;
        };
        let steps = by_source[winner].round_ties_even() as u64;
        *days.entry(minute.date_naive()).or_default() += steps;
    }

    DailyTotals { days }
}
