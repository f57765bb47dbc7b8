use rijdupe::duplicates::DeduplicationEngine;
use rijdupe::record::{Field, RawValue};
use rijdupe::source::{JsonFileSource, MemorySource, RecordSource, SourceError};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_mixed_value_types_from_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.json");
    fs::write(
        &path,
        r#"[{
            "name": "Rijschool Jansen",
            "city": "Utrecht",
            "rating": 4.5,
            "review_count": 120,
            "success_rate": "72%",
            "courses": ["B", "AM"],
            "phone": null,
            "extra": {"nested": true}
        }]"#,
    )
    .unwrap();

    let records = JsonFileSource::new(&path).fetch().unwrap();
    assert_eq!(records.len(), 1);
    let raw = &records[0];
    assert_eq!(raw.get(Field::Rating), &RawValue::Float(4.5));
    assert_eq!(raw.get(Field::ReviewCount), &RawValue::Integer(120));
    assert!(raw.get(Field::Phone).is_blank());
    assert_eq!(raw.unknown_keys().collect::<Vec<_>>(), vec!["extra"]);

    let mut engine = DeduplicationEngine::with_defaults();
    let outcome = engine.ingest(raw.clone());
    assert!(outcome.is_created());
    let record = &engine.records()[0].record;
    assert_eq!(record.success_rate, Some(72));
    assert_eq!(record.review_count, Some(120));
}

#[test]
fn test_sources_behind_trait_objects() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.ndjson");
    fs::write(
        &path,
        "{\"name\": \"A\", \"city\": \"Ede\"}\n{\"name\": \"B\", \"city\": \"Ede\"}\n",
    )
    .unwrap();

    let mut sources: Vec<Box<dyn RecordSource>> = vec![
        Box::new(JsonFileSource::new(&path)),
        Box::new(MemorySource::new(
            "memory",
            vec![rijdupe::record::RawRecord::new().with("name", "C").with("city", "Ede")],
        )),
    ];

    let mut total = 0;
    for source in &mut sources {
        total += source.fetch().unwrap().len();
    }
    assert_eq!(total, 3);
}

#[test]
fn test_scalar_document_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.json");
    fs::write(&path, "42").unwrap();

    let err = JsonFileSource::new(&path).fetch().unwrap_err();
    assert!(matches!(err, SourceError::Parse { .. }));
    assert!(err.to_string().contains("dump.json"));
}
