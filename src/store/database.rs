//! SQLite persistence of canonical records.
//!
//! Rows live in `driving_schools`, keyed on each record's `natural_key`.
//! The key is fixed when the record is first created and travels through
//! backups, so re-persisting a working set (or a resumed run of it) updates
//! rows in place even after a merge has rewritten the name or address.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

use crate::record::{CanonicalRecord, RecordId, ValidatedRecord};

/// Errors from the SQLite store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to encode courses: {0}")]
    Courses(#[from] serde_json::Error),

    #[error("Stored timestamp '{value}' is not RFC 3339: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Rows touched by [`SqliteStore::persist`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub inserted: usize,
    pub updated: usize,
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS driving_schools (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        natural_key TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        url TEXT,
        address TEXT,
        city TEXT NOT NULL,
        phone TEXT,
        email TEXT,
        website TEXT,
        rating REAL,
        review_count INTEGER,
        success_rate INTEGER,
        price_range TEXT,
        courses TEXT NOT NULL DEFAULT '[]',
        source TEXT,
        scraped_at TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        last_updated TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_driving_schools_city ON driving_schools(city);
    CREATE INDEX IF NOT EXISTS idx_driving_schools_name ON driving_schools(name);
    CREATE INDEX IF NOT EXISTS idx_driving_schools_rating ON driving_schools(rating);
";

const UPSERT: &str = "
    INSERT INTO driving_schools (
        natural_key, name, url, address, city, phone, email, website, rating,
        review_count, success_rate, price_range, courses, source, scraped_at,
        is_active, last_updated
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
    ON CONFLICT(natural_key) DO UPDATE SET
        name = excluded.name,
        url = excluded.url,
        address = excluded.address,
        city = excluded.city,
        phone = excluded.phone,
        email = excluded.email,
        website = excluded.website,
        rating = excluded.rating,
        review_count = excluded.review_count,
        success_rate = excluded.success_rate,
        price_range = excluded.price_range,
        courses = excluded.courses,
        source = excluded.source,
        scraped_at = excluded.scraped_at,
        is_active = excluded.is_active,
        last_updated = excluded.last_updated,
        updated_at = CURRENT_TIMESTAMP
";

const SELECT_ALL: &str = "
    SELECT id, name, url, address, city, phone, email, website, rating,
           review_count, success_rate, price_range, courses, source,
           scraped_at, is_active, last_updated, natural_key
    FROM driving_schools
    ORDER BY id
";

/// A `driving_schools` database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Fails if the directory or database cannot be created.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        log::debug!("Opening database {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    /// In-memory database.
    ///
    /// # Errors
    ///
    /// Fails if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Upsert every record in one transaction.
    ///
    /// # Errors
    ///
    /// Any SQLite failure rolls the whole batch back.
    pub fn persist(&mut self, records: &[CanonicalRecord]) -> Result<PersistSummary, StoreError> {
        let tx = self.conn.transaction()?;
        let mut summary = PersistSummary::default();
        {
            let mut exists = tx.prepare_cached("SELECT 1 FROM driving_schools WHERE natural_key = ?1")?;
            let mut upsert = tx.prepare_cached(UPSERT)?;

            for canonical in records {
                let r = &canonical.record;
                let key = &canonical.natural_key;
                let known = exists
                    .query_row(params![key], |_| Ok(()))
                    .optional()?
                    .is_some();

                upsert.execute(params![
                    key,
                    r.name,
                    r.url,
                    r.address,
                    r.city,
                    r.phone,
                    r.email,
                    r.website,
                    r.rating,
                    r.review_count,
                    r.success_rate,
                    r.price_range,
                    serde_json::to_string(&r.courses)?,
                    r.source,
                    r.scraped_at.to_rfc3339(),
                    canonical.is_active,
                    canonical.last_updated.to_rfc3339(),
                ])?;

                if known {
                    summary.updated += 1;
                } else {
                    summary.inserted += 1;
                }
            }
        }
        tx.commit()?;

        log::info!(
            "Persisted {} records ({} new, {} updated)",
            records.len(),
            summary.inserted,
            summary.updated
        );
        Ok(summary)
    }

    /// Number of stored rows.
    ///
    /// # Errors
    ///
    /// SQLite failures.
    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM driving_schools", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// Read every stored row back. Ids are the database row ids.
    ///
    /// # Errors
    ///
    /// SQLite failures or undecodable columns.
    pub fn load_all(&self) -> Result<Vec<CanonicalRecord>, StoreError> {
        let mut stmt = self.conn.prepare(SELECT_ALL)?;
        let rows = stmt.query_map([], StoredRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_canonical()?);
        }
        Ok(records)
    }
}

/// Raw column values of one row.
struct StoredRow {
    id: i64,
    natural_key: String,
    record: ValidatedRecord,
    courses: String,
    scraped_at: String,
    is_active: bool,
    last_updated: String,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let mut record = ValidatedRecord::new(row.get::<_, String>(1)?, row.get::<_, String>(4)?, Utc::now());
        record.url = row.get(2)?;
        record.address = row.get(3)?;
        record.phone = row.get(5)?;
        record.email = row.get(6)?;
        record.website = row.get(7)?;
        record.rating = row.get(8)?;
        record.review_count = row.get(9)?;
        record.success_rate = row.get(10)?;
        record.price_range = row.get(11)?;
        record.source = row.get(13)?;

        Ok(Self {
            id: row.get(0)?,
            natural_key: row.get(17)?,
            record,
            courses: row.get(12)?,
            scraped_at: row.get(14)?,
            is_active: row.get(15)?,
            last_updated: row.get(16)?,
        })
    }

    fn into_canonical(self) -> Result<CanonicalRecord, StoreError> {
        let mut record = self.record;
        record.courses = serde_json::from_str(&self.courses)?;
        record.scraped_at = parse_stored(&self.scraped_at)?;

        Ok(CanonicalRecord {
            id: RecordId(u64::try_from(self.id).unwrap_or_default()),
            natural_key: self.natural_key,
            record,
            is_active: self.is_active,
            last_updated: parse_stored(&self.last_updated)?,
        })
    }
}

fn parse_stored(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| StoreError::Timestamp {
            value: value.to_string(),
            source,
        })
}
