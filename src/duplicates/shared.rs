//! Thread-safe wrapper around [`DeduplicationEngine`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::record::{CanonicalRecord, RawRecord, RecordId};

use super::engine::{DeduplicationEngine, IngestOutcome, IngestStats};

/// A cloneable handle that serializes every call through one lock.
///
/// Each `ingest` runs to completion before the next starts, so concurrent
/// producers observe the same outcomes they would in some sequential order.
#[derive(Debug, Clone, Default)]
pub struct SharedEngine {
    inner: Arc<Mutex<DeduplicationEngine>>,
}

impl SharedEngine {
    /// Create a shared engine from configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::from_engine(DeduplicationEngine::new(config))
    }

    /// Share an existing engine.
    #[must_use]
    pub fn from_engine(engine: DeduplicationEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    // A panic inside one ingest leaves the working set consistent (records are
    // pushed whole), so a poisoned lock is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, DeduplicationEngine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`DeduplicationEngine::ingest`].
    pub fn ingest(&self, raw: RawRecord) -> IngestOutcome {
        self.lock().ingest(raw)
    }

    /// See [`DeduplicationEngine::ingest_at`].
    pub fn ingest_at(&self, raw: &RawRecord, now: DateTime<Utc>) -> IngestOutcome {
        self.lock().ingest_at(raw, now)
    }

    /// See [`DeduplicationEngine::set_active`].
    pub fn set_active(&self, id: RecordId, active: bool) -> bool {
        self.lock().set_active(id, active)
    }

    /// Copy of the current working set.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CanonicalRecord> {
        self.lock().records().to_vec()
    }

    /// Number of canonical records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Engine counters.
    #[must_use]
    pub fn stats(&self) -> IngestStats {
        self.lock().stats()
    }

    /// Take the engine back. Fails with `self` while other handles exist.
    ///
    /// # Errors
    ///
    /// Returns the handle unchanged if it is not the last one.
    pub fn into_inner(self) -> Result<DeduplicationEngine, Self> {
        Arc::try_unwrap(self.inner)
            .map(|mutex| mutex.into_inner().unwrap_or_else(PoisonError::into_inner))
            .map_err(|inner| Self { inner })
    }
}
