//! Machine-readable summary of an ingest run (`--json-summary`).
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "stats": {
//!     "received": 120, "created": 80, "merged": 25, "unchanged": 10,
//!     "rejected": 5, "dropped_fields": 7
//!   },
//!   "coverage": {
//!     "total": 80, "unique_cities": 31, "with_phone": 70, "with_email": 44,
//!     "with_website": 61, "with_rating": 52, "active": 80
//!   },
//!   "backup": "data/schools_20240601_120000.json",
//!   "duration_ms": 412,
//!   "interrupted": false,
//!   "exit_code": 3,
//!   "exit_code_name": "RJ003"
//! }
//! ```

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::duplicates::IngestStats;
use crate::error::ExitCode;
use crate::store::CoverageStats;

/// Summary of one ingest run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub stats: IngestStats,
    pub coverage: CoverageStats,
    /// Path of the backup written by this run, if any.
    pub backup: Option<String>,
    pub duration_ms: u64,
    pub interrupted: bool,
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "RJ003")
    pub exit_code_name: String,
}

impl JsonOutput {
    #[must_use]
    pub fn new(
        stats: IngestStats,
        coverage: CoverageStats,
        backup: Option<&Path>,
        duration: Duration,
        interrupted: bool,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            stats,
            coverage,
            backup: backup.map(|p| p.display().to_string()),
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
