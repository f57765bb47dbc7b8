//! Output formats for the deduplicated working set.
//!
//! - [`backup`]: timestamped, checksummed JSON backups that can seed a later run
//! - [`csv`]: spreadsheet export, one row per school
//! - [`json`]: run summary for automation
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use rijdupe::duplicates::DeduplicationEngine;
//! use rijdupe::output::{backup, CsvOutput};
//! use std::path::Path;
//!
//! let engine = DeduplicationEngine::with_defaults();
//! backup::write_backup(Path::new("data"), engine.records(), Utc::now()).unwrap();
//! CsvOutput::new(engine.records()).write_to(std::io::stdout()).unwrap();
//! ```

pub mod backup;
pub mod csv;
pub mod json;

pub use backup::{write_backup, Backup, BackupError};
pub use csv::{CsvOutput, CsvOutputError};
pub use json::{JsonOutput, JsonOutputError};
