//! Record sources.
//!
//! Anything that yields raw listings implements [`RecordSource`]: a scraper,
//! a dump on disk, or a fixed list in tests. The engine never sees where a
//! record came from beyond its optional `source` field.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::record::{Field, RawRecord};

/// Errors from reading a source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse {path} line {line}: {source}")]
    ParseLine {
        path: PathBuf,
        /// 1-based.
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A producer of raw records.
pub trait RecordSource {
    /// Label used in logs and progress output.
    fn name(&self) -> &str;

    /// Fetch every record the source has.
    ///
    /// # Errors
    ///
    /// Source-specific; a failed fetch yields no records.
    fn fetch(&mut self) -> Result<Vec<RawRecord>, SourceError>;
}

/// Shapes accepted in a `.json` file.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    List(Vec<RawRecord>),
    Wrapped {
        #[serde(alias = "schools")]
        records: Vec<RawRecord>,
    },
}

/// Raw records from a JSON file on disk.
///
/// Accepts a top-level array of objects, an object with a `records` (or
/// `schools`) array, or, for `.jsonl`/`.ndjson` files, one object per line.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    name: String,
    /// Value written into `source` when a record has none.
    default_source: Option<String>,
}

impl JsonFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self {
            path,
            name,
            default_source: None,
        }
    }

    /// Tag records lacking a `source` with this label.
    #[must_use]
    pub fn with_default_source(mut self, source: impl Into<String>) -> Self {
        self.default_source = Some(source.into());
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_json_lines(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson"))
    }

    fn parse_lines(&self, content: &str) -> Result<Vec<RawRecord>, SourceError> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|source| SourceError::ParseLine {
                    path: self.path.clone(),
                    line: i + 1,
                    source,
                })
            })
            .collect()
    }
}

impl RecordSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&mut self) -> Result<Vec<RawRecord>, SourceError> {
        let content = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;

        let mut records = if self.is_json_lines() {
            self.parse_lines(&content)?
        } else {
            let doc: JsonDocument =
                serde_json::from_str(&content).map_err(|source| SourceError::Parse {
                    path: self.path.clone(),
                    source,
                })?;
            match doc {
                JsonDocument::List(records) | JsonDocument::Wrapped { records } => records,
            }
        };

        if let Some(label) = &self.default_source {
            for record in &mut records {
                if record.get(Field::Source).is_blank() {
                    record.insert("source", label.as_str());
                }
            }
        }

        log::debug!("Read {} records from {}", records.len(), self.name);
        Ok(records)
    }
}

/// A fixed list of records, handed out once.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    records: Vec<RawRecord>,
}

impl MemorySource {
    #[must_use]
    pub fn new(name: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

impl RecordSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&mut self) -> Result<Vec<RawRecord>, SourceError> {
        Ok(std::mem::take(&mut self.records))
    }
}
