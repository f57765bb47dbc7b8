//! CSV export of canonical records.
//!
//! One row per record, columns in the order of [`CsvRow`]. Courses are
//! joined with `"; "`; absent values are empty cells.
//!
//! # Example
//!
//! ```
//! use rijdupe::output::csv::CsvOutput;
//!
//! let csv = CsvOutput::new(&[]).to_string().unwrap();
//! assert!(csv.starts_with("id,name,url,address,city"));
//! ```

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::record::CanonicalRecord;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: u64,
    name: &'a str,
    url: Option<&'a str>,
    address: Option<&'a str>,
    city: &'a str,
    phone: Option<&'a str>,
    email: Option<&'a str>,
    website: Option<&'a str>,
    rating: Option<f64>,
    review_count: Option<u32>,
    success_rate: Option<u8>,
    price_range: Option<&'a str>,
    courses: String,
    source: Option<&'a str>,
    scraped_at: String,
    is_active: bool,
    last_updated: String,
}

impl<'a> CsvRow<'a> {
    fn from_canonical(canonical: &'a CanonicalRecord) -> Self {
        let r = &canonical.record;
        Self {
            id: canonical.id.0,
            name: &r.name,
            url: r.url.as_deref(),
            address: r.address.as_deref(),
            city: &r.city,
            phone: r.phone.as_deref(),
            email: r.email.as_deref(),
            website: r.website.as_deref(),
            rating: r.rating,
            review_count: r.review_count,
            success_rate: r.success_rate,
            price_range: r.price_range.as_deref(),
            courses: r.courses.iter().map(String::as_str).collect::<Vec<_>>().join("; "),
            source: r.source.as_deref(),
            scraped_at: r.scraped_at.to_rfc3339(),
            is_active: canonical.is_active,
            last_updated: canonical.last_updated.to_rfc3339(),
        }
    }
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    records: &'a [CanonicalRecord],
}

impl<'a> CsvOutput<'a> {
    #[must_use]
    pub fn new(records: &'a [CanonicalRecord]) -> Self {
        Self { records }
    }

    /// Write the CSV output to the given writer.
    ///
    /// The header row is written even when there are no records.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record(HEADER)?;
        for canonical in self.records {
            csv_writer.serialize(CsvRow::from_canonical(canonical))?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

const HEADER: [&str; 17] = [
    "id",
    "name",
    "url",
    "address",
    "city",
    "phone",
    "email",
    "website",
    "rating",
    "review_count",
    "success_rate",
    "price_range",
    "courses",
    "source",
    "scraped_at",
    "is_active",
    "last_updated",
];
