//! Record model for scraped driving-school listings.
//!
//! Records move through three stages:
//!
//! * [`RawRecord`]: field mapping exactly as a scraper produced it.
//! * [`ValidatedRecord`]: cleaned fields, required fields present.
//! * [`CanonicalRecord`]: member of the deduplicated working set.
//!
//! Many raw records may end up merged into a single canonical record.

pub mod canonical;
pub mod field;
pub mod raw;
pub mod validated;

pub use canonical::{natural_key, CanonicalRecord, RecordId};
pub use field::{Field, UnknownField};
pub use raw::{RawRecord, RawValue};
pub use validated::ValidatedRecord;
