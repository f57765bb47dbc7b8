//! Command-line interface definitions for rijdupe.
//!
//! # Example
//!
//! ```bash
//! # Validate and deduplicate two scrape dumps, writing data/schools_*.json
//! rijdupe ingest amsterdam.json utrecht.jsonl
//!
//! # Continue from an earlier backup and upsert into SQLite
//! rijdupe ingest new.json --resume data/schools_20240601_120000.json --db schools.db
//!
//! # Coverage of a backup
//! rijdupe stats data/schools_20240601_120000.json
//!
//! # Debug logging
//! rijdupe -v ingest dump.json
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Validate and deduplicate scraped driving-school listings.
///
/// Raw records are cleaned field by field, matched against the schools
/// already seen in the same city, and merged when similar enough. The result
/// is written as a timestamped JSON backup and optionally to SQLite and CSV.
#[derive(Debug, Parser)]
#[command(name = "rijdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report errors as a JSON object on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: platform config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate, deduplicate and save raw records
    Ingest(IngestArgs),
    /// Show data coverage of a backup or database
    Stats(StatsArgs),
    /// Print the effective configuration, or write a default file
    Config(ConfigArgs),
}

/// Arguments for the ingest subcommand.
#[derive(Debug, Args, Default)]
pub struct IngestArgs {
    /// JSON (array or object with a `records` list) or JSON Lines files
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for the JSON backup
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Seed the working set from an earlier backup
    #[arg(long, value_name = "BACKUP")]
    pub resume: Option<PathBuf>,

    /// Upsert the result into this SQLite database
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Export the result as CSV
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Similarity at or above which records merge, in (0, 1]
    #[arg(long, value_name = "F", value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Take a missing city from the listing url
    #[arg(long)]
    pub infer_city: bool,

    /// Label for records without a `source` field
    #[arg(long, value_name = "LABEL")]
    pub source_label: Option<String>,

    /// Print a JSON run summary on stdout instead of the text report
    #[arg(long)]
    pub json_summary: bool,
}

/// Arguments for the stats subcommand.
#[derive(Debug, Args)]
#[command(group(clap::ArgGroup::new("target").required(true).args(["backup", "db"])))]
pub struct StatsArgs {
    /// Backup file written by `ingest`
    #[arg(value_name = "BACKUP")]
    pub backup: Option<PathBuf>,

    /// SQLite database written by `ingest --db`
    #[arg(long, value_name = "PATH", conflicts_with = "backup")]
    pub db: Option<PathBuf>,
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Write the default configuration to the config path and exit
    #[arg(long)]
    pub init: bool,

    /// Overwrite an existing file with --init
    #[arg(long, requires = "init")]
    pub force: bool,
}

/// Parse a merge threshold in `(0, 1]`.
///
/// ```
/// use rijdupe::cli::parse_threshold;
///
/// assert_eq!(parse_threshold("0.85").unwrap(), 0.85);
/// assert!(parse_threshold("0").is_err());
/// assert!(parse_threshold("1.2").is_err());
/// ```
///
/// # Errors
///
/// Returns an error for non-numbers and values outside `(0, 1]`.
pub fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: '{s}'"))?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("Threshold must lie in (0, 1], got {value}"))
    }
}
