//! Duplicate detection and merging.
//!
//! This module provides:
//! - Similarity scoring between listings ([`similarity`])
//! - The create/merge/skip decision and field merging ([`policy`])
//! - The working-set engine ([`engine`]) and its thread-safe handle ([`shared`])

pub mod engine;
pub mod policy;
pub mod shared;
pub mod similarity;

pub use engine::{DeduplicationEngine, IngestOutcome, IngestStats};
pub use policy::{merge_into, Action, MergePolicy, MergeReport, DEFAULT_MERGE_THRESHOLD};
pub use shared::SharedEngine;
pub use similarity::{score, RecordKey, ScoreBreakdown, SimilarityScorer, SimilarityWeights};
