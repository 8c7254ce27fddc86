//! JSON output format for the daily summary

use serde::{Deserialize, Serialize};

use crate::aggregate::DailyTotals;

/// One day's resolved total
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDailyTotal {
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// De-duplicated total for the date
    pub steps: u64,
}

/// Render the daily summary as a JSON array, ascending by date.
pub fn daily_to_json(totals: &DailyTotals) -> serde_json::Result<String> {
    let days: Vec<JsonDailyTotal> = totals
        .iter()
        .map(|(date, steps)| JsonDailyTotal {
            date: date.to_string(),
            steps,
        })
        .collect();
    serde_json::to_string_pretty(&days)
}
