//! Scrape timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::record::RawValue;

use super::InvalidReason;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a timestamp.
///
/// Accepts RFC 3339, naive date-times (taken as UTC), plain dates (midnight
/// UTC) and integer unix seconds.
pub(crate) fn parse_timestamp(raw: &RawValue) -> Result<DateTime<Utc>, InvalidReason> {
    match raw {
        RawValue::Text(s) => parse_text(s.trim()),
        RawValue::Integer(secs) => {
            DateTime::from_timestamp(*secs, 0).ok_or(InvalidReason::BadTimestamp)
        }
        _ => Err(InvalidReason::UnexpectedType),
    }
}

fn parse_text(s: &str) -> Result<DateTime<Utc>, InvalidReason> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or(InvalidReason::BadTimestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let parsed = parse_timestamp(&RawValue::from("2024-03-01T12:00:00+01:00")).unwrap();
        assert_eq!(parsed, utc(2024, 3, 1, 11, 0, 0));
    }

    #[test]
    fn test_naive_iso_forms() {
        let expected = utc(2024, 3, 1, 12, 30, 5);
        assert_eq!(parse_timestamp(&RawValue::from("2024-03-01T12:30:05")).unwrap(), expected);
        assert_eq!(parse_timestamp(&RawValue::from("2024-03-01 12:30:05")).unwrap(), expected);

        let fractional = parse_timestamp(&RawValue::from("2024-03-01T12:30:05.123456")).unwrap();
        assert_eq!(fractional.timestamp(), expected.timestamp());
    }

    #[test]
    fn test_date_only() {
        assert_eq!(
            parse_timestamp(&RawValue::from("2024-03-01")).unwrap(),
            utc(2024, 3, 1, 0, 0, 0)
        );
    }

    #[test]
    fn test_unix_seconds() {
        assert_eq!(
            parse_timestamp(&RawValue::Integer(1_700_000_000)).unwrap().timestamp(),
            1_700_000_000
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_timestamp(&RawValue::from("gisteren")), Err(InvalidReason::BadTimestamp));
        assert_eq!(parse_timestamp(&RawValue::from("2024-13-01")), Err(InvalidReason::BadTimestamp));
        assert_eq!(parse_timestamp(&RawValue::Float(1.5)), Err(InvalidReason::UnexpectedType));
    }
}
