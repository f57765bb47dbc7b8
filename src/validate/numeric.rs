//! Ratings, review counts and success percentages.

use std::sync::OnceLock;

use regex::Regex;

use crate::record::RawValue;

use super::InvalidReason;

/// Highest valid star rating.
pub const MAX_RATING: f64 = 5.0;

/// Highest valid success percentage.
pub const MAX_SUCCESS_RATE: f64 = 100.0;

static DIGIT_RUN_RE: OnceLock<Regex> = OnceLock::new();

fn digit_run_regex() -> &'static Regex {
    DIGIT_RUN_RE.get_or_init(|| Regex::new(r"\d+").expect("digit pattern is valid"))
}

/// Parse a decimal from a number or text; accepts `,` as decimal separator
/// and a trailing `%`.
fn parse_decimal(raw: &RawValue) -> Result<f64, InvalidReason> {
    let value = match raw {
        RawValue::Integer(i) => *i as f64,
        RawValue::Float(f) => *f,
        RawValue::Text(s) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| InvalidReason::NotANumber)?,
        _ => return Err(InvalidReason::UnexpectedType),
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InvalidReason::NotANumber)
    }
}

/// Star rating in `[0, 5]`. Values outside the range are rejected, not clamped.
pub(crate) fn rating(raw: &RawValue) -> Result<f64, InvalidReason> {
    let value = parse_decimal(raw)?;
    if (0.0..=MAX_RATING).contains(&value) {
        Ok(value)
    } else {
        Err(InvalidReason::OutOfRange)
    }
}

/// Success percentage in `[0, 100]`, rounded to a whole percent.
pub(crate) fn success_rate(raw: &RawValue) -> Result<u8, InvalidReason> {
    let value = parse_decimal(raw)?;
    if (0.0..=MAX_SUCCESS_RATE).contains(&value) {
        Ok(value.round() as u8)
    } else {
        Err(InvalidReason::OutOfRange)
    }
}

/// Non-negative review count.
///
/// Text such as `"(123 beoordelingen)"` yields its first run of digits.
pub(crate) fn review_count(raw: &RawValue) -> Result<u32, InvalidReason> {
    match raw {
        RawValue::Integer(i) => u32::try_from(*i).map_err(|_| InvalidReason::OutOfRange),
        RawValue::Float(f) if f.is_finite() && f.fract() == 0.0 => {
            if (0.0..=f64::from(u32::MAX)).contains(f) {
                Ok(*f as u32)
            } else {
                Err(InvalidReason::OutOfRange)
            }
        }
        RawValue::Float(_) => Err(InvalidReason::NotANumber),
        RawValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('-') {
                return Err(InvalidReason::OutOfRange);
            }
            let digits = digit_run_regex()
                .find(trimmed)
                .ok_or(InvalidReason::NotANumber)?;
            digits
                .as_str()
                .parse::<u32>()
                .map_err(|_| InvalidReason::OutOfRange)
        }
        _ => Err(InvalidReason::UnexpectedType),
    }
}
