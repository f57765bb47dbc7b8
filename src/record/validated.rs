//! Records whose fields have been cleaned and checked.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validate::text::fold_key;

/// A listing that passed validation.
///
/// `name` and `city` are never empty. Every optional field is either absent
/// or holds a value that satisfied its validator (see [`crate::validate`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub name: String,
    pub url: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub success_rate: Option<u8>,
    pub price_range: Option<String>,
    #[serde(default)]
    pub courses: BTreeSet<String>,
    pub source: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl ValidatedRecord {
    /// Create a record with only the required fields set.
    #[must_use]
    pub fn new(name: impl Into<String>, city: impl Into<String>, scraped_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            url: None,
            address: None,
            city: city.into(),
            phone: None,
            email: None,
            website: None,
            rating: None,
            review_count: None,
            success_rate: None,
            price_range: None,
            courses: BTreeSet::new(),
            source: None,
            scraped_at,
        }
    }

    /// Set the address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the source label.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Normalized city used to bucket candidates.
    ///
    /// Case, diacritics and punctuation are ignored, so `"Den Haag"` and
    /// `"den  haag"` share a key.
    #[must_use]
    pub fn city_key(&self) -> String {
        fold_key(&self.city)
    }
}
