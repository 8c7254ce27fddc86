//! CSV output for the raw passthrough and the daily summary

use std::io::{self, Write};

use crate::aggregate::DailyTotals;
use crate::record::RawRecord;

/// Fixed column set of the raw passthrough file
pub const RAW_HEADER: &str =
    "startDate,endDate,creationDate,value,unit,sourceName,sourceVersion,device";

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    // If field contains comma, quote, or newline, wrap in quotes and escape quotes
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Streaming writer for the raw passthrough file.
///
/// Every input record is echoed verbatim, one row each, whether or not it was
/// eligible for apportionment.
#[derive(Debug)]
pub struct RawCsvWriter<W: Write> {
    out: W,
}

impl<W: Write> RawCsvWriter<W> {
    /// Wrap a writer and emit the header row.
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "{RAW_HEADER}")?;
        Ok(Self { out })
    }

    /// Write one record, values exactly as received.
    pub fn write_record(&mut self, record: &RawRecord) -> io::Result<()> {
        let fields = [
            &record.start_date,
            &record.end_date,
            &record.creation_date,
            &record.value,
            &record.unit,
            &record.source_name,
            &record.source_version,
            &record.device,
        ];
        let row: Vec<String> = fields.iter().map(|field| escape_field(field)).collect();
        writeln!(self.out, "{}", row.join(","))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Render the daily summary as CSV, one row per date, ascending.
pub fn daily_to_csv(totals: &DailyTotals) -> String {
    let mut output = String::new();
    output.push_str("date,steps\n");

    for (date, steps) in totals.iter() {
        output.push_str(&format!("{date},{steps}\n"));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::MinuteAccumulator;
    use crate::aggregate::aggregate;
    use crate::resolver::SourcePriority;
    use crate::timeparse::parse_timestamp;

    #[test]
    fn test_escape_field_simple() {
        assert_eq!(escape_field("hello"), "hello");
    }

    #[test]
    fn test_escape_field_with_comma() {
        assert_eq!(escape_field("hello,world"), "\"hello,world\"");
    }

    #[test]
    fn test_escape_field_with_quote() {
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_escape_field_with_newline() {
        assert_eq!(escape_field("a\nb"), "\"a\nb\"");
    }

    #[test]
    fn test_raw_writer_header() {
        let mut buf = Vec::new();
        RawCsvWriter::new(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "startDate,endDate,creationDate,value,unit,sourceName,sourceVersion,device\n"
        );
    }

    #[test]
    fn test_raw_writer_verbatim_row() {
        let mut buf = Vec::new();
        {
            let mut writer = RawCsvWriter::new(&mut buf).unwrap();
            writer
                .write_record(&RawRecord {
                    start_date: "2025-01-01 00:00:30 +0000".to_string(),
                    end_date: "2025-01-01 00:02:30 +0000".to_string(),
                    creation_date: "2025-01-01 00:03:00 +0000".to_string(),
                    value: "100".to_string(),
                    unit: "count".to_string(),
                    source_name: "Apple Watch".to_string(),
                    source_version: "11.0".to_string(),
                    device: "<<HKDevice: 0x1>, name:Apple Watch>>".to_string(),
                })
                .unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "2025-01-01 00:00:30 +0000,2025-01-01 00:02:30 +0000,2025-01-01 00:03:00 +0000,\
             100,count,Apple Watch,11.0,\"<<HKDevice: 0x1>, name:Apple Watch>>\""
        );
    }

    #[test]
    fn test_raw_writer_echoes_invalid_values_unmodified() {
        let mut buf = Vec::new();
        {
            let mut writer = RawCsvWriter::new(&mut buf).unwrap();
            writer
                .write_record(&RawRecord {
                    start_date: "not-a-date".to_string(),
                    value: "lots".to_string(),
                    ..RawRecord::default()
                })
                .unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().nth(1).unwrap(), "not-a-date,,,lots,,,,");
    }

    #[test]
    fn test_daily_csv_header_only_when_empty() {
        assert_eq!(daily_to_csv(&DailyTotals::default()), "date,steps\n");
    }

    #[test]
    fn test_daily_csv_rows_ascending() {
        let mut acc = MinuteAccumulator::new();
        acc.add(
            parse_timestamp("2025-01-02 08:00:00 +0000").unwrap(),
            "Watch",
            30.0,
        );
        acc.add(
            parse_timestamp("2025-01-01 08:00:00 +0000").unwrap(),
            "Watch",
            20.0,
        );
        let totals = aggregate(&acc, &SourcePriority::default());

        assert_eq!(
            daily_to_csv(&totals),
            "date,steps\n2025-01-01,20\n2025-01-02,30\n"
        );
    }
}
