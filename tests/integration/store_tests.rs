use chrono::{TimeZone, Utc};
use rijdupe::duplicates::{DeduplicationEngine, IngestOutcome};
use rijdupe::output::{write_backup, Backup};
use rijdupe::record::{RawRecord, RecordId};
use rijdupe::store::{CoverageStats, PersistSummary, SqliteStore};
use tempfile::tempdir;

fn raw(name: &str, city: &str, address: &str) -> RawRecord {
    RawRecord::new()
        .with("name", name)
        .with("city", city)
        .with("address", address)
}

#[test]
fn test_repeated_runs_upsert_in_place() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("schools.db");
    let t1 = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2024, 6, 8, 12, 0, 0).unwrap();

    let mut first = DeduplicationEngine::with_defaults();
    first.ingest_at(&raw("Rijschool Jansen", "Utrecht", "Kerkstraat 1"), t1);
    first.ingest_at(&raw("Rijschool Bakker", "Utrecht", "Markt 3"), t1);
    let summary = SqliteStore::open(&db).unwrap().persist(first.records()).unwrap();
    assert_eq!(summary, PersistSummary { inserted: 2, updated: 0 });

    // A later, independent run sees Jansen again with a phone number and a new school.
    let mut second = DeduplicationEngine::with_defaults();
    second.ingest_at(
        &raw("RIJSCHOOL JANSEN", "utrecht", "Kerkstraat 1").with("phone", "0301234567"),
        t2,
    );
    second.ingest_at(&raw("Rijschool Smit", "Ede", "Dorpsstraat 2"), t2);
    let summary = SqliteStore::open(&db).unwrap().persist(second.records()).unwrap();
    assert_eq!(summary, PersistSummary { inserted: 1, updated: 1 });

    let store = SqliteStore::open(&db).unwrap();
    assert_eq!(store.count().unwrap(), 3);
    let rows = store.load_all().unwrap();
    let jansen = rows.iter().find(|r| r.name() == "Rijschool Jansen").unwrap();
    assert_eq!(jansen.record.phone.as_deref(), Some("030-1234567"));
    assert_eq!(jansen.last_updated, t2);
}

#[test]
fn test_resumed_merge_with_new_address_updates_same_row() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("schools.db");
    let t1 = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2024, 6, 8, 12, 0, 0).unwrap();

    let mut first = DeduplicationEngine::with_defaults();
    first.ingest_at(&raw("Rijschool Jansen", "Utrecht", "Kerkstraat 1"), t1);
    SqliteStore::open(&db).unwrap().persist(first.records()).unwrap();
    let backup = write_backup(&dir.path().join("out"), first.records(), t1).unwrap();

    let mut second = DeduplicationEngine::with_defaults();
    second.restore(Backup::load(&backup).unwrap().records);
    let outcome = second.ingest_at(&raw("Rijschool Jansen", "Utrecht", "Kerkstraat 1a"), t2);
    assert_eq!(
        outcome,
        IngestOutcome::Merged {
            id: RecordId(1),
            changed: true
        }
    );
    assert_eq!(second.len(), 1);

    let summary = SqliteStore::open(&db).unwrap().persist(second.records()).unwrap();
    assert_eq!(summary, PersistSummary { inserted: 0, updated: 1 });

    let store = SqliteStore::open(&db).unwrap();
    assert_eq!(store.count().unwrap(), second.len());
    let rows = store.load_all().unwrap();
    assert_eq!(rows[0].record.address.as_deref(), Some("Kerkstraat 1a"));
}

#[test]
fn test_coverage_from_database_matches_memory() {
    let t = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let mut engine = DeduplicationEngine::with_defaults();
    engine.ingest_at(
        &raw("Rijschool Jansen", "Utrecht", "Kerkstraat 1")
            .with("email", "info@jansen.nl")
            .with("website", "https://jansen.nl"),
        t,
    );
    engine.ingest_at(&raw("Rijschool Bakker", "Zwolle", "Markt 3").with("rating", 4.0), t);

    let mut store = SqliteStore::open_in_memory().unwrap();
    store.persist(engine.records()).unwrap();

    let from_db = CoverageStats::from_records(&store.load_all().unwrap());
    assert_eq!(from_db, CoverageStats::from_records(engine.records()));
    assert_eq!(from_db.with_email, 1);
    assert_eq!(from_db.with_website, 1);
    assert_eq!(from_db.with_rating, 1);
    assert_eq!(from_db.unique_cities, 2);
}

#[test]
fn test_inactive_flag_is_persisted() {
    let mut engine = DeduplicationEngine::with_defaults();
    let id = engine
        .ingest(raw("Rijschool Jansen", "Utrecht", "Kerkstraat 1"))
        .id()
        .unwrap();
    assert!(engine.set_active(id, false));

    let mut store = SqliteStore::open_in_memory().unwrap();
    store.persist(engine.records()).unwrap();
    let rows = store.load_all().unwrap();
    assert!(!rows[0].is_active);
    assert_eq!(CoverageStats::from_records(&rows).active, 0);
}
