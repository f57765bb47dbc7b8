//! Similarity scoring between two listings.
//!
//! # Algorithm
//!
//! 1. Fold city, name and address into comparison keys (diacritics removed,
//!    punctuation dropped, lowercased). Names also lose a leading generic
//!    prefix such as `Rijschool`, so `"Rijschool Jansen"` and `"Autorijschool
//!    Jansen"` compare as `"jansen"`.
//! 2. Different cities score `0.0`. City is a gate, not just a weighted term.
//! 3. Otherwise the score is the weighted mean of
//!    - name similarity (normalized Levenshtein),
//!    - address similarity (normalized Levenshtein), only when both records
//!      have an address,
//!    - the city match itself (always `1.0` past the gate).
//!
//!    A missing address removes its term and the remaining weights are
//!    renormalized, so absent data never counts as a mismatch.
//!
//! Scores are deterministic, symmetric and lie in `[0, 1]`.

use serde::{Deserialize, Serialize};

use crate::record::ValidatedRecord;
use crate::validate::text::{collapse_whitespace, fold_key};

/// Generic leading words that carry no identity. Longest first.
const GENERIC_NAME_PREFIXES: [&str; 5] = [
    "autorijschool",
    "motorrijschool",
    "verkeersschool",
    "rijopleidingen",
    "rijschool",
];

/// Relative weight of each score component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    pub name: f64,
    pub address: f64,
    pub city: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            name: 0.5,
            address: 0.3,
            city: 0.2,
        }
    }
}

/// Pre-folded comparison keys of one record.
///
/// The engine keeps one per canonical record so folding happens once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKey {
    pub city: String,
    pub name: String,
    pub address: Option<String>,
}

impl RecordKey {
    /// Build the keys of a record.
    #[must_use]
    pub fn of(record: &ValidatedRecord) -> Self {
        let address = record
            .address
            .as_deref()
            .map(fold_key)
            .filter(|a| !a.is_empty());
        Self {
            city: record.city_key(),
            name: name_key(&record.name),
            address,
        }
    }
}

/// Fold a school name and drop a leading generic prefix.
///
/// A name with no letters or digits at all keys on its lowercased text, so
/// distinct names never share an empty key.
///
/// ```
/// use rijdupe::duplicates::similarity::name_key;
///
/// assert_eq!(name_key("Autorijschool Jansen & Zn."), "jansen zn");
/// assert_eq!(name_key("Rijschool"), "rijschool");
/// assert_eq!(name_key("* * *"), "* * *");
/// ```
#[must_use]
pub fn name_key(name: &str) -> String {
    let folded = fold_key(name);
    if folded.is_empty() {
        return collapse_whitespace(name).to_lowercase();
    }
    for prefix in GENERIC_NAME_PREFIXES {
        if let Some(rest) = folded.strip_prefix(prefix) {
            if let Some(rest) = rest.strip_prefix(' ') {
                if !rest.is_empty() {
                    return rest.to_string();
                }
            }
        }
    }
    folded
}

/// Similarity of two folded strings in `[0, 1]`. An empty key matches nothing.
#[must_use]
pub fn text_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b)
}

/// Per-component view of a score, for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub same_city: bool,
    pub name: f64,
    /// `None` when either side has no address.
    pub address: Option<f64>,
    pub score: f64,
}

/// Weighted similarity scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer {
    weights: SimilarityWeights,
}

impl SimilarityScorer {
    /// Create a scorer with the given weights.
    #[must_use]
    pub fn new(weights: SimilarityWeights) -> Self {
        Self { weights }
    }

    /// The weights in use.
    #[must_use]
    pub fn weights(&self) -> SimilarityWeights {
        self.weights
    }

    /// Score two validated records.
    #[must_use]
    pub fn score(&self, a: &ValidatedRecord, b: &ValidatedRecord) -> f64 {
        self.score_keys(&RecordKey::of(a), &RecordKey::of(b))
    }

    /// Score two sets of pre-folded keys.
    #[must_use]
    pub fn score_keys(&self, a: &RecordKey, b: &RecordKey) -> f64 {
        self.breakdown_keys(a, b).score
    }

    /// Score two records and report each component.
    #[must_use]
    pub fn breakdown(&self, a: &ValidatedRecord, b: &ValidatedRecord) -> ScoreBreakdown {
        self.breakdown_keys(&RecordKey::of(a), &RecordKey::of(b))
    }

    fn breakdown_keys(&self, a: &RecordKey, b: &RecordKey) -> ScoreBreakdown {
        let name = text_similarity(&a.name, &b.name);
        let address = match (&a.address, &b.address) {
            (Some(x), Some(y)) => Some(text_similarity(x, y)),
            _ => None,
        };

        if a.city != b.city {
            return ScoreBreakdown {
                same_city: false,
                name,
                address,
                score: 0.0,
            };
        }

        let w = self.weights;
        let mut weighted = w.name * name + w.city;
        let mut total = w.name + w.city;
        if let Some(sim) = address {
            weighted += w.address * sim;
            total += w.address;
        }

        let score = if total > 0.0 {
            (weighted / total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        ScoreBreakdown {
            same_city: true,
            name,
            address,
            score,
        }
    }
}

/// Score two records with the default weights.
///
/// ```
/// use chrono::Utc;
/// use rijdupe::duplicates::similarity::score;
/// use rijdupe::record::ValidatedRecord;
///
/// let now = Utc::now();
/// let a = ValidatedRecord::new("Rijschool Jansen", "Utrecht", now);
/// let b = ValidatedRecord::new("Rijschool Jansen", "Amsterdam", now);
/// assert_eq!(score(&a, &b), 0.0);
/// assert_eq!(score(&a, &a), 1.0);
/// ```
#[must_use]
pub fn score(a: &ValidatedRecord, b: &ValidatedRecord) -> f64 {
    SimilarityScorer::default().score(a, b)
}
