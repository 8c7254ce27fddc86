//! End-to-end pipeline: ingest, de-duplicate, aggregate, write outputs
//!
//! Data flows strictly forward: raw record -> apportioner -> accumulator ->
//! resolver -> daily totals. The accumulator is owned here, mutated only
//! during ingestion, and read once in full by the aggregation step.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::accumulator::MinuteAccumulator;
use crate::aggregate;
use crate::apportion;
use crate::cli::OutputFormat;
use crate::csv_output::{self, RawCsvWriter};
use crate::export::ExportReader;
use crate::json_output;
use crate::record::{Measurement, RawRecord};
use crate::resolver::SourcePriority;

/// Configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Record type to ingest; everything else in the document is ignored
    pub quantity_type: String,
    /// Source priority policy for per-minute de-duplication
    pub priority: SourcePriority,
    /// Format of the daily summary file
    pub output_format: OutputFormat,
    /// Raw passthrough destination
    pub raw_path: PathBuf,
    /// Daily summary destination
    pub daily_path: PathBuf,
}

/// Counters reported after a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records echoed to the raw passthrough
    pub records: u64,
    /// Records that contributed shares to the totals
    pub apportioned: u64,
    /// Dates with at least one contributing minute
    pub days: usize,
}

/// Fold a stream of raw records into the accumulator, echoing every record
/// to the raw passthrough on the way.
///
/// Ineligible records (bad timestamps, non-positive values, degenerate
/// intervals) are echoed but contribute nothing; so do intervals too short
/// to touch a whole minute. Returns (records seen, records apportioned).
pub fn ingest<I, E, W>(
    records: I,
    raw: &mut RawCsvWriter<W>,
    acc: &mut MinuteAccumulator,
) -> Result<(u64, u64)>
where
    I: IntoIterator<Item = Result<RawRecord, E>>,
    E: std::error::Error + Send + Sync + 'static,
    W: Write,
{
    let mut records_seen = 0u64;
    let mut apportioned = 0u64;

    for record in records {
        let record = record.context("failed to read record")?;
        raw.write_record(&record)
            .context("failed to write raw passthrough row")?;
        records_seen += 1;

        let measurement = match Measurement::from_raw(&record) {
            Ok(measurement) => measurement,
            Err(reason) => {
                tracing::debug!(%reason, source = %record.source_name, "record skipped from totals");
                continue;
            }
        };

        let shares = apportion::apportion(measurement.start, measurement.end, measurement.value);
        if shares.is_empty() {
            tracing::debug!(
                source = %measurement.source,
                value = measurement.value,
                "interval touches no whole minute; value dropped"
            );
            continue;
        }
        for (slot, share) in shares {
            acc.add(slot, &measurement.source, share);
        }
        apportioned += 1;
    }

    Ok((records_seen, apportioned))
}

/// Run the full pipeline over one export document.
pub fn run(input: &Path, config: &PipelineConfig) -> Result<RunSummary> {
    let reader = ExportReader::open(input, &config.quantity_type)
        .with_context(|| format!("failed to open {}", input.display()))?;

    let raw_file = File::create(&config.raw_path)
        .with_context(|| format!("failed to create {}", config.raw_path.display()))?;
    let mut raw =
        RawCsvWriter::new(BufWriter::new(raw_file)).context("failed to write raw header")?;

    let mut acc = MinuteAccumulator::new();
    let (records, apportioned) = ingest(reader, &mut raw, &mut acc)?;
    raw.flush().context("failed to flush raw passthrough")?;
    tracing::debug!(records, apportioned, minutes = acc.len(), "ingest complete");

    let totals = aggregate::aggregate(&acc, &config.priority);

    let rendered = match config.output_format {
        OutputFormat::Csv => csv_output::daily_to_csv(&totals),
        OutputFormat::Json => {
            json_output::daily_to_json(&totals).context("failed to serialize daily totals")?
        }
    };
    std::fs::write(&config.daily_path, rendered)
        .with_context(|| format!("failed to write {}", config.daily_path.display()))?;

    Ok(RunSummary {
        records,
        apportioned,
        days: totals.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportError;
    use crate::resolver;
    use chrono::NaiveDate;
    use std::convert::Infallible;

    fn raw(start: &str, end: &str, value: &str, source: &str) -> Result<RawRecord, Infallible> {
        Ok(RawRecord {
            start_date: start.to_string(),
            end_date: end.to_string(),
            value: value.to_string(),
            source_name: source.to_string(),
            ..RawRecord::default()
        })
    }

    fn date(text: &str) -> NaiveDate {
        text.parse().unwrap()
    }

    #[test]
    fn test_ingest_counts_and_accumulates() {
        let records = vec![
            raw(
                "2025-01-01 00:00:30 +0000",
                "2025-01-01 00:02:30 +0000",
                "100",
                "Watch",
            ),
            raw("bad", "2025-01-01 00:02:30 +0000", "100", "Watch"),
        ];
        let mut buf = Vec::new();
        let mut writer = RawCsvWriter::new(&mut buf).unwrap();
        let mut acc = MinuteAccumulator::new();

        let (seen, apportioned) = ingest(records, &mut writer, &mut acc).unwrap();

        assert_eq!(seen, 2);
        assert_eq!(apportioned, 1);
        assert_eq!(acc.len(), 2);
        // Both rows reach the passthrough, header included.
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_ingest_drops_sub_minute_interval() {
        let records = vec![raw(
            "2025-01-01 00:00:10 +0000",
            "2025-01-01 00:00:50 +0000",
            "42",
            "Watch",
        )];
        let mut buf = Vec::new();
        let mut writer = RawCsvWriter::new(&mut buf).unwrap();
        let mut acc = MinuteAccumulator::new();

        let (seen, apportioned) = ingest(records, &mut writer, &mut acc).unwrap();

        assert_eq!(seen, 1);
        assert_eq!(apportioned, 0);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_ingest_propagates_reader_errors() {
        let records: Vec<Result<RawRecord, ExportError>> =
            vec![Err(ExportError::UnterminatedElement)];
        let mut buf = Vec::new();
        let mut writer = RawCsvWriter::new(&mut buf).unwrap();
        let mut acc = MinuteAccumulator::new();

        assert!(ingest(records, &mut writer, &mut acc).is_err());
    }

    #[test]
    fn test_overlapping_sources_count_once() {
        // Two overlapping sources; Watch wins minute 00:01 by priority and
        // the day totals 100, not 105.
        let records = vec![
            raw(
                "2025-01-01 00:00:30 +0000",
                "2025-01-01 00:02:30 +0000",
                "100",
                "Watch",
            ),
            raw(
                "2025-01-01 00:01:00 +0000",
                "2025-01-01 00:01:30 +0000",
                "5",
                "iPhone",
            ),
        ];
        let mut buf = Vec::new();
        let mut writer = RawCsvWriter::new(&mut buf).unwrap();
        let mut acc = MinuteAccumulator::new();
        ingest(records, &mut writer, &mut acc).unwrap();

        let totals = aggregate::aggregate(&acc, &SourcePriority::from_list("Watch,iPhone"));
        assert_eq!(totals.get(date("2025-01-01")), Some(100));
    }

    #[test]
    fn test_ingest_fallback_scenario_never_sums_sources() {
        let records = vec![
            raw(
                "2025-01-01 00:01:00 +0000",
                "2025-01-01 00:02:00 +0000",
                "10",
                "Pedometer",
            ),
            raw(
                "2025-01-01 00:01:00 +0000",
                "2025-01-01 00:02:00 +0000",
                "7",
                "Fitbit",
            ),
        ];
        let mut buf = Vec::new();
        let mut writer = RawCsvWriter::new(&mut buf).unwrap();
        let mut acc = MinuteAccumulator::new();
        ingest(records, &mut writer, &mut acc).unwrap();

        let totals = aggregate::aggregate(&acc, &SourcePriority::default());
        assert_eq!(totals.get(date("2025-01-01")), Some(7));
    }

    #[test]
    fn test_run_summary_default() {
        let summary = RunSummary::default();
        assert_eq!(summary.records, 0);
        assert_eq!(summary.apportioned, 0);
        assert_eq!(summary.days, 0);
    }

    #[test]
    fn test_pipeline_config_clone() {
        let config = PipelineConfig {
            quantity_type: "HKQuantityTypeIdentifierStepCount".to_string(),
            priority: SourcePriority::from_list(resolver::DEFAULT_PRIORITY),
            output_format: OutputFormat::Csv,
            raw_path: PathBuf::from("steps_raw.csv"),
            daily_path: PathBuf::from("steps_daily.csv"),
        };
        let cloned = config.clone();
        assert_eq!(cloned.quantity_type, config.quantity_type);
    }
}
