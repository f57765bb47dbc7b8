//! Merge decisions and field-by-field merging.

use std::fmt;

use serde::Serialize;

use crate::record::{CanonicalRecord, Field, ValidatedRecord};

/// Default similarity at or above which two records are the same school.
pub const DEFAULT_MERGE_THRESHOLD: f64 = 0.8;

/// What to do with a candidate given its best match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// No existing record matches well enough.
    CreateNew,
    /// Fold the candidate into the existing record.
    Merge,
    /// Same school, and merging would change no descriptive field.
    Skip,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateNew => "create",
            Self::Merge => "merge",
            Self::Skip => "skip",
        })
    }
}

/// What a merge changed.
///
/// `scraped_at` and `last_updated` are bookkeeping: they advance on every
/// newer sighting and are not listed in `changed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Descriptive fields whose value changed, in column order.
    pub changed: Vec<Field>,
    /// Whether `last_updated` moved forward.
    pub last_updated_advanced: bool,
}

impl MergeReport {
    /// Whether no descriptive field changed.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Threshold-based merge policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergePolicy {
    threshold: f64,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MERGE_THRESHOLD,
        }
    }
}

impl MergePolicy {
    /// Create a policy with the given threshold.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// The merge threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Decide how `candidate` relates to `existing` at similarity `score`.
    ///
    /// A NaN score never merges.
    #[must_use]
    pub fn decide(&self, existing: &CanonicalRecord, candidate: &ValidatedRecord, score: f64) -> Action {
        if score.is_nan() || score < self.threshold {
            return Action::CreateNew;
        }
        let mut probe = existing.clone();
        if merge_into(&mut probe, candidate).is_noop() {
            Action::Skip
        } else {
            Action::Merge
        }
    }
}

/// Fold `candidate` into `existing` in place.
///
/// * Descriptive fields prefer a present value over an absent one. When both
///   are present and differ, the candidate wins only if it was scraped after
///   `existing.last_updated`.
/// * `review_count` keeps the maximum, `courses` the union.
/// * `source` becomes the ordered, distinct union of both.
/// * `scraped_at` and `last_updated` only move forward.
///
/// `is_active` and `id` are never touched.
pub fn merge_into(existing: &mut CanonicalRecord, candidate: &ValidatedRecord) -> MergeReport {
    let newer = candidate.scraped_at > existing.last_updated;
    let mut changed = Vec::new();
    let target = &mut existing.record;

    if newer && !candidate.name.is_empty() && candidate.name != target.name {
        target.name.clone_from(&candidate.name);
        changed.push(Field::Name);
    }
    if lww(&mut target.url, &candidate.url, newer) {
        changed.push(Field::Url);
    }
    if lww(&mut target.address, &candidate.address, newer) {
        changed.push(Field::Address);
    }
    if newer && !candidate.city.is_empty() && candidate.city != target.city {
        target.city.clone_from(&candidate.city);
        changed.push(Field::City);
    }
    if lww(&mut target.phone, &candidate.phone, newer) {
        changed.push(Field::Phone);
    }
    if lww(&mut target.email, &candidate.email, newer) {
        changed.push(Field::Email);
    }
    if lww(&mut target.website, &candidate.website, newer) {
        changed.push(Field::Website);
    }
    if lww(&mut target.rating, &candidate.rating, newer) {
        changed.push(Field::Rating);
    }

    let review_count = match (target.review_count, candidate.review_count) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    if review_count != target.review_count {
        target.review_count = review_count;
        changed.push(Field::ReviewCount);
    }

    if lww(&mut target.success_rate, &candidate.success_rate, newer) {
        changed.push(Field::SuccessRate);
    }
    if lww(&mut target.price_range, &candidate.price_range, newer) {
        changed.push(Field::PriceRange);
    }

    let before = target.courses.len();
    target.courses.extend(candidate.courses.iter().cloned());
    if target.courses.len() != before {
        changed.push(Field::Courses);
    }

    let source = union_sources(target.source.as_deref(), candidate.source.as_deref());
    if source != target.source {
        target.source = source;
        changed.push(Field::Source);
    }

    if candidate.scraped_at > target.scraped_at {
        target.scraped_at = candidate.scraped_at;
    }

    let last_updated_advanced = newer;
    if newer {
        existing.last_updated = candidate.scraped_at;
    }

    MergeReport {
        changed,
        last_updated_advanced,
    }
}

/// Last-write-wins for one optional field. Returns whether `target` changed.
fn lww<T: Clone + PartialEq>(target: &mut Option<T>, candidate: &Option<T>, newer: bool) -> bool {
    match (target.as_ref(), candidate) {
        (_, None) => false,
        (None, Some(value)) => {
            *target = Some(value.clone());
            true
        }
        (Some(current), Some(value)) if newer && current != value => {
            *target = Some(value.clone());
            true
        }
        _ => false,
    }
}

/// Distinct, order-preserving union of two comma-separated source lists.
fn union_sources(existing: Option<&str>, candidate: Option<&str>) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for list in [existing, candidate].into_iter().flatten() {
        for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if !parts.contains(&part) {
                parts.push(part);
            }
        }
    }
    if parts.is_empty() {
        existing.map(str::to_string)
    } else {
        Some(parts.join(", "))
    }
}
