//! Field and record validation.
//!
//! [`validate`] checks a single raw value against the rules of its field.
//! [`RecordValidator`] applies it to every field of a [`RawRecord`], drops
//! invalid optional fields and rejects records without a name or city.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use rijdupe::record::RawRecord;
//! use rijdupe::validate::validate_record;
//!
//! let raw = RawRecord::new()
//!     .with("name", "RIJSCHOOL JANSEN")
//!     .with("city", "Utrecht")
//!     .with("phone", "+31 6 12345678")
//!     .with("rating", 7.5);
//!
//! let report = validate_record(&raw, Utc::now()).unwrap();
//! assert_eq!(report.record.name, "Rijschool Jansen");
//! assert_eq!(report.record.phone.as_deref(), Some("06-12345678"));
//! assert_eq!(report.record.rating, None);
//! assert_eq!(report.dropped.len(), 1);
//! ```

pub mod contact;
pub mod numeric;
pub mod phone;
pub mod text;
pub mod timestamp;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::record::{Field, RawRecord, RawValue, ValidatedRecord};

/// Longest raw value quoted in a [`ValidationError`].
const MAX_QUOTED_LEN: usize = 64;

/// Why a single value failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidReason {
    #[error("unexpected value type")]
    UnexpectedType,
    #[error("expected 10 digits, found {0}")]
    DigitCount(usize),
    #[error("not a Dutch phone number")]
    NotAPhoneNumber,
    #[error("malformed email address")]
    MalformedEmail,
    #[error("not an absolute http(s) url")]
    NotHttpUrl,
    #[error("not a number")]
    NotANumber,
    #[error("value out of range")]
    OutOfRange,
    #[error("unrecognized timestamp")]
    BadTimestamp,
}

/// A field value that failed validation. The field is dropped, the record kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field} '{value}': {reason}")]
pub struct ValidationError {
    pub field: Field,
    /// The offending raw value, shortened for display.
    pub value: String,
    pub reason: InvalidReason,
}

impl ValidationError {
    fn new(field: Field, raw: &RawValue, reason: InvalidReason) -> Self {
        let rendered = raw.to_string();
        let value = if rendered.chars().count() > MAX_QUOTED_LEN {
            let mut short: String = rendered.chars().take(MAX_QUOTED_LEN).collect();
            short.push('…');
            short
        } else {
            rendered
        };
        Self { field, value, reason }
    }
}

/// Reason a whole record is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecordRejection {
    #[error("required field '{0}' is missing or empty")]
    RequiredFieldMissing(Field),
}

/// A cleaned value, typed per field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Rating(f64),
    Count(u32),
    Percent(u8),
    Courses(BTreeSet<String>),
    Timestamp(DateTime<Utc>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Rating(r) => write!(f, "{r}"),
            Self::Count(n) => write!(f, "{n}"),
            Self::Percent(p) => write!(f, "{p}%"),
            Self::Courses(set) => {
                let joined: Vec<&str> = set.iter().map(String::as_str).collect();
                f.write_str(&joined.join(", "))
            }
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

/// Validate one raw value for `field`.
///
/// Returns `Ok(None)` for null or blank input, which is always allowed at
/// this level (required fields are enforced by [`RecordValidator`]).
///
/// ```
/// use rijdupe::record::{Field, RawValue};
/// use rijdupe::validate::{validate, FieldValue, InvalidReason};
///
/// let phone = validate(Field::Phone, &RawValue::from("020 123 4567")).unwrap();
/// assert_eq!(phone, Some(FieldValue::Text("020-1234567".into())));
///
/// assert_eq!(validate(Field::Email, &RawValue::Null).unwrap(), None);
///
/// let err = validate(Field::Rating, &RawValue::Float(9.0)).unwrap_err();
/// assert_eq!(err.reason, InvalidReason::OutOfRange);
/// ```
///
/// # Errors
///
/// A [`ValidationError`] naming the field, the value and the reason.
pub fn validate(field: Field, raw: &RawValue) -> Result<Option<FieldValue>, ValidationError> {
    if raw.is_blank() {
        return Ok(None);
    }
    check(field, raw).map_err(|reason| ValidationError::new(field, raw, reason))
}

fn check(field: Field, raw: &RawValue) -> Result<Option<FieldValue>, InvalidReason> {
    let value = match field {
        Field::Name | Field::City => text::clean_proper_name(raw)?.map(FieldValue::Text),
        Field::Address | Field::PriceRange | Field::Source => {
            text::clean(raw)?.map(FieldValue::Text)
        }
        Field::Url | Field::Website => {
            Some(FieldValue::Text(contact::validate_url(&scalar_text(raw)?)?))
        }
        Field::Phone => Some(FieldValue::Text(phone::normalize_phone(&scalar_text(raw)?)?)),
        Field::Email => Some(FieldValue::Text(contact::validate_email(&scalar_text(raw)?)?)),
        Field::Rating => Some(FieldValue::Rating(numeric::rating(raw)?)),
        Field::ReviewCount => Some(FieldValue::Count(numeric::review_count(raw)?)),
        Field::SuccessRate => Some(FieldValue::Percent(numeric::success_rate(raw)?)),
        Field::Courses => text::courses(raw)?.map(FieldValue::Courses),
        Field::ScrapedAt => Some(FieldValue::Timestamp(timestamp::parse_timestamp(raw)?)),
    };
    Ok(value)
}

fn scalar_text(raw: &RawValue) -> Result<String, InvalidReason> {
    match raw {
        RawValue::Text(s) => Ok(s.clone()),
        RawValue::Integer(i) => Ok(i.to_string()),
        _ => Err(InvalidReason::UnexpectedType),
    }
}

/// Result of validating one record.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub record: ValidatedRecord,
    /// Optional fields that were present but invalid, and therefore dropped.
    pub dropped: Vec<ValidationError>,
    /// Keys in the raw record that name no known field.
    pub unknown_fields: Vec<String>,
}

impl ValidationReport {
    /// Whether every present field was valid.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// Whole-record validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordValidator {
    infer_city_from_url: bool,
}

impl RecordValidator {
    /// Create a validator with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a missing city from a `/rijscholen/<city>/` listing url.
    #[must_use]
    pub fn with_city_from_url(mut self, enabled: bool) -> Self {
        self.infer_city_from_url = enabled;
        self
    }

    /// Validate every field of `raw`.
    ///
    /// `now` becomes `scraped_at` when the record carries none (or an
    /// unparseable one).
    ///
    /// # Errors
    ///
    /// [`RecordRejection::RequiredFieldMissing`] when `name` or `city` is
    /// absent, blank or of an unusable type.
    pub fn validate(
        &self,
        raw: &RawRecord,
        now: DateTime<Utc>,
    ) -> Result<ValidationReport, RecordRejection> {
        let mut record = ValidatedRecord::new(String::new(), String::new(), now);
        let mut dropped = Vec::new();

        for field in Field::ALL {
            match validate(field, raw.get(field)) {
                Ok(Some(value)) => assign(&mut record, field, value),
                Ok(None) => {}
                Err(err) => {
                    log::warn!("Dropping field: {err}");
                    dropped.push(err);
                }
            }
        }

        if record.city.is_empty() && self.infer_city_from_url {
            if let Some(city) = record.url.as_deref().and_then(text::city_from_url) {
                log::debug!("Inferred city '{city}' from listing url");
                record.city = city;
            }
        }

        for required in [Field::Name, Field::City] {
            let value = match required {
                Field::Name => &record.name,
                _ => &record.city,
            };
            if value.is_empty() {
                return Err(RecordRejection::RequiredFieldMissing(required));
            }
        }

        let unknown_fields: Vec<String> = raw.unknown_keys().map(str::to_string).collect();
        for key in &unknown_fields {
            match Field::suggest(key) {
                Some(hint) => log::debug!("Ignoring unknown field '{key}' (did you mean '{hint}'?)"),
                None => log::debug!("Ignoring unknown field '{key}'"),
            }
        }

        Ok(ValidationReport {
            record,
            dropped,
            unknown_fields,
        })
    }
}

/// Validate a record with default settings.
///
/// # Errors
///
/// See [`RecordValidator::validate`].
pub fn validate_record(
    raw: &RawRecord,
    now: DateTime<Utc>,
) -> Result<ValidationReport, RecordRejection> {
    RecordValidator::default().validate(raw, now)
}

fn assign(record: &mut ValidatedRecord, field: Field, value: FieldValue) {
    match (field, value) {
        (Field::Name, FieldValue::Text(s)) => record.name = s,
        (Field::City, FieldValue::Text(s)) => record.city = s,
        (Field::Url, FieldValue::Text(s)) => record.url = Some(s),
        (Field::Address, FieldValue::Text(s)) => record.address = Some(s),
        (Field::Phone, FieldValue::Text(s)) => record.phone = Some(s),
        (Field::Email, FieldValue::Text(s)) => record.email = Some(s),
        (Field::Website, FieldValue::Text(s)) => record.website = Some(s),
        (Field::PriceRange, FieldValue::Text(s)) => record.price_range = Some(s),
        (Field::Source, FieldValue::Text(s)) => record.source = Some(s),
        (Field::Rating, FieldValue::Rating(r)) => record.rating = Some(r),
        (Field::ReviewCount, FieldValue::Count(n)) => record.review_count = Some(n),
        (Field::SuccessRate, FieldValue::Percent(p)) => record.success_rate = Some(p),
        (Field::Courses, FieldValue::Courses(set)) => record.courses = set,
        (Field::ScrapedAt, FieldValue::Timestamp(t)) => record.scraped_at = t,
        (field, value) => log::trace!("No slot for {field} value '{value}'"),
    }
}
