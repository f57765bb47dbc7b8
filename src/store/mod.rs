//! Persistence collaborators: SQLite storage and coverage statistics.

pub mod coverage;
pub mod database;

pub use coverage::CoverageStats;
pub use crate::record::natural_key;
pub use database::{PersistSummary, SqliteStore, StoreError};
