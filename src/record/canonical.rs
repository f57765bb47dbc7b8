//! Canonical records held in the deduplicated working set.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidatedRecord;
use crate::duplicates::similarity::name_key;
use crate::validate::text::fold_key;

/// Handle of a canonical record inside one working set.
///
/// Storage assigns its own row ids; this one only identifies the record
/// while the engine owns it (and across a backup/restore cycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Key identifying one school across runs.
///
/// ```
/// use rijdupe::record::natural_key;
///
/// assert_eq!(
///     natural_key("Autorijschool Jansen", "UTRECHT", Some("Kerkstraat 1")),
///     natural_key("Jansen", "utrecht", Some("kerkstraat  1")),
/// );
/// ```
#[must_use]
pub fn natural_key(name: &str, city: &str, address: Option<&str>) -> String {
    format!(
        "{}|{}|{}",
        fold_key(city),
        name_key(name),
        address.map(fold_key).unwrap_or_default()
    )
}

/// One real-world driving school after deduplication.
///
/// Created on first sight, mutated in place by every merge, never removed.
/// Liveness is tracked through `is_active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub id: RecordId,
    /// Storage identity, taken from the first sighting. Merges that rewrite
    /// the name or address leave it alone.
    pub natural_key: String,
    #[serde(flatten)]
    pub record: ValidatedRecord,
    pub is_active: bool,
    pub last_updated: DateTime<Utc>,
}

impl CanonicalRecord {
    /// Promote a validated record into the working set.
    #[must_use]
    pub fn promote(id: RecordId, record: ValidatedRecord) -> Self {
        let last_updated = record.scraped_at;
        let natural_key = natural_key(&record.name, &record.city, record.address.as_deref());
        Self {
            id,
            natural_key,
            record,
            is_active: true,
            last_updated,
        }
    }

    /// Shorthand for the school name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Shorthand for the city.
    #[must_use]
    pub fn city(&self) -> &str {
        &self.record.city
    }
}
