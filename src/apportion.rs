//! Interval apportionment: split one measurement across whole-minute slots
//!
//! A slot is the start of a whole minute and represents `[slot, slot + 1min)`.
//! The value is split equally across the slots the interval covers, not
//! weighted by per-slot overlap. An interval too short to reach a minute
//! boundary produces no slots and its value is dropped from the totals.

use chrono::{DateTime, Duration, FixedOffset};

use crate::timeparse::minute_floor;

/// Lazy iterator over the whole-minute slots covered by one interval.
#[derive(Debug, Clone)]
pub struct MinuteSlots {
    next: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

/// Yield the minute slots for `[start, end)`: the minute floor of `start`
/// (bumped forward one minute when `start` is not on a boundary), then
/// one-minute steps while strictly before `end`.
pub fn minute_slots(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> MinuteSlots {
    let mut first = minute_floor(start);
    if first < start {
        first += Duration::minutes(1);
    }
    MinuteSlots { next: first, end }
}

impl Iterator for MinuteSlots {
    type Item = DateTime<FixedOffset>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let slot = self.next;
        self.next += Duration::minutes(1);
        Some(slot)
    }
}

/// Split `value` equally across the minute slots of `[start, end)`.
///
/// Pure function of its inputs. Returns the empty vector when the interval
/// touches no whole minute, in which case the value contributes nothing.
pub fn apportion(
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    value: f64,
) -> Vec<(DateTime<FixedOffset>, f64)> {
    let slots: Vec<DateTime<FixedOffset>> = minute_slots(start, end).collect();
    if slots.is_empty() {
        return Vec::new();
    }
    let share = value / slots.len() as f64;
    slots.into_iter().map(|slot| (slot, share)).collect()
}
