//! Field names shared by raw, validated and canonical records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.85;

/// A known listing field.
///
/// The string form of each variant is the exact key used in raw records and
/// the column name used by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Url,
    Address,
    City,
    Phone,
    Email,
    Website,
    Rating,
    ReviewCount,
    SuccessRate,
    PriceRange,
    Courses,
    Source,
    ScrapedAt,
}

impl Field {
    /// Every field, in column order.
    pub const ALL: [Field; 14] = [
        Field::Name,
        Field::Url,
        Field::Address,
        Field::City,
        Field::Phone,
        Field::Email,
        Field::Website,
        Field::Rating,
        Field::ReviewCount,
        Field::SuccessRate,
        Field::PriceRange,
        Field::Courses,
        Field::Source,
        Field::ScrapedAt,
    ];

    /// The raw-record key / column name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Url => "url",
            Self::Address => "address",
            Self::City => "city",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Website => "website",
            Self::Rating => "rating",
            Self::ReviewCount => "review_count",
            Self::SuccessRate => "success_rate",
            Self::PriceRange => "price_range",
            Self::Courses => "courses",
            Self::Source => "source",
            Self::ScrapedAt => "scraped_at",
        }
    }

    /// Whether a record is rejected when this field is empty.
    #[must_use]
    pub fn is_required(self) -> bool {
        matches!(self, Self::Name | Self::City)
    }

    /// Suggest the closest known field for a misspelled key.
    ///
    /// ```
    /// use rijdupe::record::Field;
    ///
    /// assert_eq!(Field::suggest("adress"), Some(Field::Address));
    /// assert_eq!(Field::suggest("opening_hours"), None);
    /// ```
    #[must_use]
    pub fn suggest(key: &str) -> Option<Field> {
        let key = key.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .map(|field| (*field, strsim::jaro_winkler(&key, field.as_str())))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(field, _)| field)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown field name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field: '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}
