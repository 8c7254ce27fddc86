//! CLI argument parsing for Recuento

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::resolver;

/// Output format for the daily summary
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// CSV rows, `date,steps` (default)
    Csv,
    /// JSON array for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "recuento")]
#[command(version)]
#[command(about = "De-duplicate overlapping quantity measurements into daily totals", long_about = None)]
pub struct Cli {
    /// Path to the health export XML document
    pub input: PathBuf,

    /// Where to write the verbatim raw-record passthrough
    #[arg(long = "raw-output", value_name = "PATH", default_value = "steps_raw.csv")]
    pub raw_output: PathBuf,

    /// Where to write the de-duplicated daily summary
    #[arg(
        long = "daily-output",
        value_name = "PATH",
        default_value = "steps_daily.csv"
    )]
    pub daily_output: PathBuf,

    /// Comma-separated source substrings that win a minute, in order
    /// (matched case-insensitively)
    #[arg(
        long = "priority",
        value_name = "LIST",
        default_value = resolver::DEFAULT_PRIORITY
    )]
    pub priority: String,

    /// Record type to ingest; all other record types are ignored
    #[arg(
        long = "quantity-type",
        value_name = "TYPE",
        default_value = "HKQuantityTypeIdentifierStepCount"
    )]
    pub quantity_type: String,

    /// Output format for the daily summary
    #[arg(long = "format", value_enum, default_value = "csv")]
    pub format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
