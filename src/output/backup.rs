//! Timestamped JSON backups of the working set.
//!
//! A backup is written as
//!
//! ```json
//! {
//!   "checksum": "<sha256 of the compact body>",
//!   "version": 1,
//!   "created_at": "2024-06-01T12:00:00Z",
//!   "records": [ ... ]
//! }
//! ```
//!
//! The checksum covers the compact serialization of `version`, `created_at`
//! and `records`, in that order. Loading recomputes it, so a hand-edited or
//! truncated backup is refused instead of silently seeding the engine.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::record::CanonicalRecord;

/// Current backup format version.
pub const BACKUP_VERSION: u32 = 1;

/// Errors from writing or reading backups.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Failed to access backup {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize backup: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to parse backup envelope. The file might be corrupted or not a backup: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Backup integrity check failed: checksum mismatch. The file may have been edited or truncated.")]
    ChecksumMismatch,

    #[error("Unsupported backup version: {found}. Current version is {BACKUP_VERSION}.")]
    UnsupportedVersion { found: u32 },
}

/// The checksummed part of a backup.
#[derive(Serialize)]
struct Body<'a> {
    version: u32,
    created_at: DateTime<Utc>,
    records: &'a [CanonicalRecord],
}

impl Body<'_> {
    fn checksum(&self) -> Result<String, BackupError> {
        let compact = serde_json::to_string(self).map_err(BackupError::Serialize)?;
        Ok(format!("{:x}", Sha256::digest(compact.as_bytes())))
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    checksum: String,
    #[serde(flatten)]
    body: Body<'a>,
}

#[derive(Deserialize)]
struct Envelope {
    checksum: String,
    version: u32,
    created_at: DateTime<Utc>,
    records: Vec<CanonicalRecord>,
}

/// A loaded backup.
#[derive(Debug, Clone, PartialEq)]
pub struct Backup {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub records: Vec<CanonicalRecord>,
}

impl Backup {
    /// Parse and verify a backup document.
    ///
    /// # Errors
    ///
    /// [`BackupError::Parse`], [`BackupError::ChecksumMismatch`] or
    /// [`BackupError::UnsupportedVersion`].
    pub fn from_json(content: &str) -> Result<Self, BackupError> {
        let envelope: Envelope = serde_json::from_str(content).map_err(BackupError::Parse)?;

        let body = Body {
            version: envelope.version,
            created_at: envelope.created_at,
            records: &envelope.records,
        };
        if body.checksum()? != envelope.checksum {
            return Err(BackupError::ChecksumMismatch);
        }
        if envelope.version != BACKUP_VERSION {
            return Err(BackupError::UnsupportedVersion {
                found: envelope.version,
            });
        }

        Ok(Self {
            version: envelope.version,
            created_at: envelope.created_at,
            records: envelope.records,
        })
    }

    /// Read and verify a backup file.
    ///
    /// # Errors
    ///
    /// I/O errors plus everything [`Backup::from_json`] reports.
    pub fn load(path: &Path) -> Result<Self, BackupError> {
        let content = fs::read_to_string(path).map_err(|source| BackupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let backup = Self::from_json(&content)?;
        log::debug!(
            "Loaded backup {} ({} records, created {})",
            path.display(),
            backup.records.len(),
            backup.created_at
        );
        Ok(backup)
    }
}

/// Serialize `records` as a pretty-printed, checksummed backup document.
///
/// # Errors
///
/// [`BackupError::Serialize`] if serialization fails.
pub fn to_json(records: &[CanonicalRecord], created_at: DateTime<Utc>) -> Result<String, BackupError> {
    let body = Body {
        version: BACKUP_VERSION,
        created_at,
        records,
    };
    let envelope = EnvelopeRef {
        checksum: body.checksum()?,
        body,
    };
    serde_json::to_string_pretty(&envelope).map_err(BackupError::Serialize)
}

/// `schools_YYYYMMDD_HHMMSS.json` for the given instant.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use rijdupe::output::backup::backup_file_name;
///
/// let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 5, 3).unwrap();
/// assert_eq!(backup_file_name(at), "schools_20240601_090503.json");
/// ```
#[must_use]
pub fn backup_file_name(at: DateTime<Utc>) -> String {
    format!("schools_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Backup name for the `n`th file written in the same second.
fn numbered_file_name(at: DateTime<Utc>, n: u32) -> String {
    match n {
        0 => backup_file_name(at),
        n => format!("schools_{}_{n}.json", at.format("%Y%m%d_%H%M%S")),
    }
}

/// Write a backup into `dir` (created if needed) and return its path.
///
/// The file is written under a temporary name and then linked into place.
/// An existing backup is never replaced: a second backup in the same second
/// gets a `_1`, `_2`, ... suffix.
///
/// # Errors
///
/// I/O or serialization failures.
pub fn write_backup(
    dir: &Path,
    records: &[CanonicalRecord],
    at: DateTime<Utc>,
) -> Result<PathBuf, BackupError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| BackupError::Io { path, source }
    };

    fs::create_dir_all(dir).map_err(io_err(dir))?;
    let tmp = dir.join(format!("{}.tmp", backup_file_name(at)));

    let json = to_json(records, at)?;
    let mut file = fs::File::create(&tmp).map_err(io_err(&tmp))?;
    file.write_all(json.as_bytes()).map_err(io_err(&tmp))?;
    file.sync_all().map_err(io_err(&tmp))?;
    drop(file);

    let mut n = 0;
    let path = loop {
        let candidate = dir.join(numbered_file_name(at, n));
        match fs::hard_link(&tmp, &candidate) {
            Ok(()) => break candidate,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(source) => {
                let _ = fs::remove_file(&tmp);
                return Err(BackupError::Io {
                    path: candidate,
                    source,
                });
            }
        }
    };
    fs::remove_file(&tmp).map_err(io_err(&tmp))?;

    log::info!("Saved {} records to {}", records.len(), path.display());
    Ok(path)
}
