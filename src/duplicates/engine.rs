//! The deduplication engine.
//!
//! # Overview
//!
//! [`DeduplicationEngine`] owns the working set of canonical records and
//! classifies every incoming raw record:
//!
//! 1. **Validate**: clean the fields; a record without name or city is
//!    rejected.
//! 2. **Bucket**: only canonical records in the same normalized city are
//!    candidates.
//! 3. **Score**: each candidate is scored against the incoming record and the
//!    best one kept. Equal top scores go to the record with the earliest
//!    `last_updated`, then the lowest id.
//! 4. **Decide**: the merge policy chooses between creating a new record,
//!    merging into the best candidate, or skipping an exact repeat.
//!
//! The working set only grows. Records are never removed, only flagged
//! inactive through [`DeduplicationEngine::set_active`].
//!
//! # Example
//!
//! ```
//! use rijdupe::duplicates::{DeduplicationEngine, IngestOutcome};
//! use rijdupe::record::RawRecord;
//!
//! let mut engine = DeduplicationEngine::with_defaults();
//! let raw = RawRecord::new()
//!     .with("name", "Rijschool Jansen")
//!     .with("city", "Utrecht");
//!
//! assert!(engine.ingest(raw.clone()).is_created());
//! assert!(matches!(engine.ingest(raw), IngestOutcome::Merged { changed: false, .. }));
//! assert_eq!(engine.len(), 1);
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::record::{CanonicalRecord, RawRecord, RecordId, ValidatedRecord};
use crate::validate::{RecordRejection, RecordValidator};

use super::policy::{merge_into, Action, MergePolicy};
use super::similarity::{RecordKey, SimilarityScorer};

/// Classification of one ingested record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new canonical record was created.
    Created { id: RecordId },
    /// The record matched an existing canonical record. `changed` is false
    /// when it added nothing new.
    Merged { id: RecordId, changed: bool },
    /// The record failed validation.
    Rejected(RecordRejection),
}

impl IngestOutcome {
    /// The canonical record this outcome refers to, if any.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        match self {
            Self::Created { id } | Self::Merged { id, .. } => Some(*id),
            Self::Rejected(_) => None,
        }
    }

    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }

    #[must_use]
    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }

    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Running counters of an engine, or of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Records handed to the engine.
    pub received: usize,
    /// New canonical records.
    pub created: usize,
    /// Merges that changed the canonical record.
    pub merged: usize,
    /// Matches that added nothing.
    pub unchanged: usize,
    /// Records refused by validation.
    pub rejected: usize,
    /// Invalid optional fields dropped from accepted records.
    pub dropped_fields: usize,
}

impl IngestStats {
    /// Records that ended up in the working set, as new or merged.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.created + self.merged + self.unchanged
    }

    /// Counters accumulated since `earlier`.
    #[must_use]
    pub fn since(&self, earlier: &IngestStats) -> IngestStats {
        IngestStats {
            received: self.received.saturating_sub(earlier.received),
            created: self.created.saturating_sub(earlier.created),
            merged: self.merged.saturating_sub(earlier.merged),
            unchanged: self.unchanged.saturating_sub(earlier.unchanged),
            rejected: self.rejected.saturating_sub(earlier.rejected),
            dropped_fields: self.dropped_fields.saturating_sub(earlier.dropped_fields),
        }
    }
}

/// Single-threaded deduplication engine.
///
/// Wrap it in [`super::SharedEngine`] to feed it from several threads.
#[derive(Debug)]
pub struct DeduplicationEngine {
    scorer: SimilarityScorer,
    policy: MergePolicy,
    validator: RecordValidator,
    records: Vec<CanonicalRecord>,
    /// Folded keys, parallel to `records`.
    keys: Vec<RecordKey>,
    /// City key to positions in `records`.
    by_city: HashMap<String, Vec<usize>>,
    index: HashMap<RecordId, usize>,
    next_id: u64,
    stats: IngestStats,
}

impl Default for DeduplicationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DeduplicationEngine {
    /// Create an engine from configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scorer: SimilarityScorer::new(config.weights),
            policy: MergePolicy::new(config.merge_threshold),
            validator: RecordValidator::new().with_city_from_url(config.infer_city_from_url),
            records: Vec::new(),
            keys: Vec::new(),
            by_city: HashMap::new(),
            index: HashMap::new(),
            next_id: 1,
            stats: IngestStats::default(),
        }
    }

    /// Create an engine with the default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Ingest a raw record, using the current time as fallback `scraped_at`.
    pub fn ingest(&mut self, raw: RawRecord) -> IngestOutcome {
        self.ingest_at(&raw, Utc::now())
    }

    /// Ingest a raw record with an explicit ingest time.
    pub fn ingest_at(&mut self, raw: &RawRecord, now: DateTime<Utc>) -> IngestOutcome {
        self.stats.received += 1;
        match self.validator.validate(raw, now) {
            Ok(report) => {
                self.stats.dropped_fields += report.dropped.len();
                self.place(report.record)
            }
            Err(rejection) => {
                log::debug!("Rejected record: {rejection}");
                self.stats.rejected += 1;
                IngestOutcome::Rejected(rejection)
            }
        }
    }

    /// Ingest a batch and return the counters for that batch alone.
    pub fn ingest_all<I>(&mut self, records: I) -> IngestStats
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let before = self.stats;
        for raw in records {
            self.ingest(raw);
        }
        self.stats.since(&before)
    }

    fn place(&mut self, record: ValidatedRecord) -> IngestOutcome {
        let key = RecordKey::of(&record);

        let Some((pos, score)) = self.best_match(&key) else {
            return self.insert(record, key);
        };

        let existing = &self.records[pos];
        let id = existing.id;
        log::trace!(
            "Best match for '{}' ({}) is {} '{}' at {:.3}",
            record.name,
            record.city,
            id,
            existing.name(),
            score
        );

        match self.policy.decide(existing, &record, score) {
            Action::CreateNew => self.insert(record, key),
            Action::Skip => {
                // Still a sighting: timestamps move forward.
                merge_into(&mut self.records[pos], &record);
                log::debug!("Repeat of {id} '{}'", record.name);
                self.stats.unchanged += 1;
                IngestOutcome::Merged { id, changed: false }
            }
            Action::Merge => {
                let report = merge_into(&mut self.records[pos], &record);
                self.keys[pos] = RecordKey::of(&self.records[pos].record);
                log::debug!(
                    "Merged '{}' into {id} (score {score:.3}, changed: {:?})",
                    record.name,
                    report.changed
                );
                self.stats.merged += 1;
                IngestOutcome::Merged { id, changed: true }
            }
        }
    }

    /// Highest-scoring same-city record; ties go to the oldest.
    fn best_match(&self, key: &RecordKey) -> Option<(usize, f64)> {
        let bucket = self.by_city.get(&key.city)?;
        let mut best: Option<(usize, f64)> = None;
        for &pos in bucket {
            let score = self.scorer.score_keys(&self.keys[pos], key);
            best = match best {
                None => Some((pos, score)),
                Some((best_pos, best_score)) => {
                    if score > best_score
                        || (score == best_score && self.is_older(pos, best_pos))
                    {
                        Some((pos, score))
                    } else {
                        Some((best_pos, best_score))
                    }
                }
            };
        }
        best
    }

    fn is_older(&self, a: usize, b: usize) -> bool {
        let (ra, rb) = (&self.records[a], &self.records[b]);
        (ra.last_updated, ra.id) < (rb.last_updated, rb.id)
    }

    fn insert(&mut self, record: ValidatedRecord, key: RecordKey) -> IngestOutcome {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        log::debug!("Created {id} '{}' ({})", record.name, record.city);
        self.push(CanonicalRecord::promote(id, record), key);
        self.stats.created += 1;
        IngestOutcome::Created { id }
    }

    fn push(&mut self, canonical: CanonicalRecord, key: RecordKey) {
        let pos = self.records.len();
        self.by_city.entry(key.city.clone()).or_default().push(pos);
        self.index.insert(canonical.id, pos);
        self.keys.push(key);
        self.records.push(canonical);
    }

    /// Seed the working set with records from an earlier run.
    ///
    /// Ids are kept. Records whose id is already present are skipped.
    /// Returns the number of records added.
    pub fn restore(&mut self, records: Vec<CanonicalRecord>) -> usize {
        let mut added = 0;
        for canonical in records {
            if self.index.contains_key(&canonical.id) {
                log::warn!("Skipping restored record with duplicate id {}", canonical.id);
                continue;
            }
            self.next_id = self.next_id.max(canonical.id.0.saturating_add(1));
            let key = RecordKey::of(&canonical.record);
            self.push(canonical, key);
            added += 1;
        }
        log::debug!("Restored {added} records, next id {}", self.next_id);
        added
    }

    /// All canonical records, in creation order.
    #[must_use]
    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    /// Look up a canonical record by id.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&CanonicalRecord> {
        self.index.get(&id).map(|&pos| &self.records[pos])
    }

    /// Flag a record active or inactive. Returns `false` for unknown ids.
    pub fn set_active(&mut self, id: RecordId, active: bool) -> bool {
        match self.index.get(&id) {
            Some(&pos) => {
                self.records[pos].is_active = active;
                true
            }
            None => false,
        }
    }

    /// Number of canonical records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Counters since the engine was created.
    #[must_use]
    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// The merge threshold in use.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.policy.threshold()
    }

    /// Consume the engine and return the working set.
    #[must_use]
    pub fn into_records(self) -> Vec<CanonicalRecord> {
        self.records
    }
}
