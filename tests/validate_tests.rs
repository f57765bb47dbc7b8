//! Whole-record validation as seen from outside the crate.

use chrono::{TimeZone, Utc};
use rijdupe::record::{Field, RawRecord, RawValue};
use rijdupe::validate::{validate, validate_record, FieldValue, InvalidReason, RecordValidator};

#[test]
fn test_scraped_listing_is_cleaned() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let raw = RawRecord::new()
        .with("name", "  RIJSCHOOL   JANSEN ")
        .with("city", "utrecht")
        .with("address", "Kerkstraat\t1")
        .with("phone", "+31 (0)30 123 45 67")
        .with("email", "Info@Jansen.NL")
        .with("website", "https://www.jansen.nl/")
        .with("rating", "4,7")
        .with("review_count", "(123 reviews)")
        .with("success_rate", "81,6%")
        .with("courses", "B, AM; A|B")
        .with("scraped_at", "2024-05-30 08:15:00")
        .with("ratng", "5");

    let report = validate_record(&raw, now).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.unknown_fields, vec!["ratng".to_string()]);

    let r = report.record;
    assert_eq!(r.name, "Rijschool Jansen");
    assert_eq!(r.city, "Utrecht");
    assert_eq!(r.address.as_deref(), Some("Kerkstraat 1"));
    assert_eq!(r.phone.as_deref(), Some("030-1234567"));
    assert_eq!(r.email.as_deref(), Some("Info@jansen.nl"));
    assert_eq!(r.rating, Some(4.7));
    assert_eq!(r.review_count, Some(123));
    assert_eq!(r.success_rate, Some(82));
    assert_eq!(r.courses.len(), 3);
    assert_eq!(r.scraped_at, Utc.with_ymd_and_hms(2024, 5, 30, 8, 15, 0).unwrap());
}

#[test]
fn test_bad_fields_are_listed_and_dropped() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let raw = RawRecord::new()
        .with("name", "Rijschool Jansen")
        .with("city", "Utrecht")
        .with("phone", "06-1234567")
        .with("rating", "-1")
        .with("success_rate", "140%")
        .with("scraped_at", "gisteren");

    let report = validate_record(&raw, now).unwrap();
    let dropped: Vec<(Field, InvalidReason)> =
        report.dropped.iter().map(|e| (e.field, e.reason)).collect();
    assert_eq!(
        dropped,
        vec![
            (Field::Phone, InvalidReason::DigitCount(9)),
            (Field::Rating, InvalidReason::OutOfRange),
            (Field::SuccessRate, InvalidReason::OutOfRange),
            (Field::ScrapedAt, InvalidReason::BadTimestamp),
        ]
    );
    // Unparseable timestamps fall back to the ingest time.
    assert_eq!(report.record.scraped_at, now);
    assert_eq!(
        report.dropped[0].to_string(),
        "invalid phone '06-1234567': expected 10 digits, found 9"
    );
}

#[test]
fn test_mixed_case_name_is_kept() {
    let raw = RawRecord::new()
        .with("name", "Rijschool de Vries")
        .with("city", "'s-Hertogenbosch");
    let record = validate_record(&raw, Utc::now()).unwrap().record;
    assert_eq!(record.name, "Rijschool de Vries");
    assert_eq!(record.city, "'s-Hertogenbosch");
}

#[test]
fn test_city_inference_is_opt_in() {
    let raw = RawRecord::new()
        .with("name", "Rijschool Jansen")
        .with("url", "https://www.example.nl/rijscholen/amersfoort/jansen");

    assert!(validate_record(&raw, Utc::now()).is_err());
    let record = RecordValidator::new()
        .with_city_from_url(true)
        .validate(&raw, Utc::now())
        .unwrap()
        .record;
    assert_eq!(record.city, "Amersfoort");
}

#[test]
fn test_field_level_contract() {
    assert_eq!(validate(Field::Website, &RawValue::from("   ")).unwrap(), None);
    assert_eq!(
        validate(Field::ReviewCount, &RawValue::Integer(5)).unwrap(),
        Some(FieldValue::Count(5))
    );
    assert_eq!(
        validate(Field::Phone, &RawValue::Bool(true)).unwrap_err().reason,
        InvalidReason::UnexpectedType
    );
    assert_eq!(
        validate(Field::Url, &RawValue::from("/rijscholen/utrecht")).unwrap_err().reason,
        InvalidReason::NotHttpUrl
    );
}
