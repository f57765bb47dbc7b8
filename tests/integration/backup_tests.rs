use chrono::{TimeZone, Utc};
use rijdupe::duplicates::DeduplicationEngine;
use rijdupe::output::backup::{self, BACKUP_VERSION};
use rijdupe::output::{Backup, BackupError};
use rijdupe::record::RawRecord;
use std::fs;
use tempfile::tempdir;

fn engine_with_records() -> DeduplicationEngine {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let mut engine = DeduplicationEngine::with_defaults();
    for (name, city) in [
        ("Rijschool Jansen", "Utrecht"),
        ("Rijschool Jansen", "Amsterdam"),
        ("Verkeersschool Bakker", "Zwolle"),
    ] {
        engine.ingest_at(&RawRecord::new().with("name", name).with("city", city), at);
    }
    engine
}

#[test]
fn test_backup_restores_into_fresh_engine() {
    let dir = tempdir().unwrap();
    let engine = engine_with_records();
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 13, 0, 0).unwrap();
    let path = backup::write_backup(dir.path(), engine.records(), at).unwrap();

    let loaded = Backup::load(&path).unwrap();
    assert_eq!(loaded.version, BACKUP_VERSION);
    assert_eq!(loaded.created_at, at);

    let mut restored = DeduplicationEngine::with_defaults();
    assert_eq!(restored.restore(loaded.records), 3);
    assert_eq!(restored.records(), engine.records());

    // New ids continue after the restored ones.
    let outcome = restored.ingest(RawRecord::new().with("name", "Rijschool Smit").with("city", "Ede"));
    assert_eq!(outcome.id().unwrap().0, 4);
}

#[test]
fn test_truncated_backup_is_rejected() {
    let dir = tempdir().unwrap();
    let path = backup::write_backup(dir.path(), engine_with_records().records(), Utc::now()).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    fs::write(&path, &content[..content.len() / 2]).unwrap();

    assert!(matches!(Backup::load(&path), Err(BackupError::Parse(_))));
}

#[test]
fn test_edited_record_is_rejected() {
    let engine = engine_with_records();
    let json = backup::to_json(engine.records(), Utc::now()).unwrap();
    let edited = json.replace("\"Zwolle\"", "\"Kampen\"");
    assert_ne!(json, edited);

    let err = Backup::from_json(&edited).unwrap_err();
    assert!(matches!(err, BackupError::ChecksumMismatch));
    assert!(err.to_string().contains("integrity check failed"));
}

#[test]
fn test_future_version_is_rejected() {
    // A valid envelope from a newer writer: recompute the checksum for version 2.
    use sha2::{Digest, Sha256};

    let created_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    // Field order must match the writer: version, created_at, records.
    let body = format!(
        r#"{{"version":2,"created_at":{},"records":[]}}"#,
        serde_json::to_string(&created_at).unwrap()
    );
    let checksum = format!("{:x}", Sha256::digest(body.as_bytes()));
    let doc = serde_json::json!({
        "checksum": checksum,
        "version": 2,
        "created_at": created_at,
        "records": [],
    });

    let err = Backup::from_json(&doc.to_string()).unwrap_err();
    assert!(matches!(err, BackupError::UnsupportedVersion { found: 2 }));
}

#[test]
fn test_missing_backup_file() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        Backup::load(&dir.path().join("nope.json")),
        Err(BackupError::Io { .. })
    ));
}
