//! rijdupe - validation and deduplication of scraped driving-school listings.
//!
//! Raw records arrive as loose field mappings. [`validate`] cleans and checks
//! every field, [`duplicates`] matches each record against the schools
//! already seen in the same city and merges it or creates a new one, and
//! [`output`] and [`store`] write the result.
//!
//! ```
//! use rijdupe::duplicates::{DeduplicationEngine, IngestOutcome};
//! use rijdupe::record::RawRecord;
//!
//! let mut engine = DeduplicationEngine::with_defaults();
//! let raw = RawRecord::new()
//!     .with("name", "Rijschool Jansen")
//!     .with("city", "Utrecht")
//!     .with("phone", "030 123 4567");
//!
//! assert!(engine.ingest(raw.clone()).is_created());
//! assert!(matches!(engine.ingest(raw), IngestOutcome::Merged { changed: false, .. }));
//! assert_eq!(engine.len(), 1);
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod record;
pub mod signal;
pub mod source;
pub mod store;
pub mod validate;

pub use app::{run_app, run_ingest, IngestReport};
