//! End-to-end runs of the ingest pipeline over files on disk.

use rijdupe::cli::IngestArgs;
use rijdupe::config::Config;
use rijdupe::error::ExitCode;
use rijdupe::output::Backup;
use rijdupe::progress::Progress;
use rijdupe::run_ingest;
use rijdupe::signal::ShutdownHandler;
use rijdupe::store::SqliteStore;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn config(dir: &Path) -> Config {
    Config {
        output_dir: dir.join("data"),
        ..Config::default()
    }
}

fn ingest(config: &Config, args: &IngestArgs) -> rijdupe::IngestReport {
    run_ingest(config, args, &ShutdownHandler::new(), &Progress::new(true)).unwrap()
}

const FIRST_DUMP: &str = r#"[
    {"name": "Rijschool Jansen", "city": "Utrecht", "address": "Kerkstraat 1",
     "phone": "030 123 4567", "rating": "4,5", "courses": "B, AM",
     "scraped_at": "2024-06-01T10:00:00Z"},
    {"name": "Rijschool Jansen", "city": "Amsterdam", "address": "Damrak 10",
     "scraped_at": "2024-06-01T10:00:00Z"},
    {"name": "AUTORIJSCHOOL DE VRIES", "city": "UTRECHT", "email": "not-an-email",
     "scraped_at": "2024-06-01T10:00:00Z"}
]"#;

const SECOND_DUMP: &str = r#"{"records": [
    {"name": "Rijschool Jansen", "city": "utrecht", "address": "Kerkstraat 1a",
     "courses": ["A"], "review_count": "(17 reviews)",
     "scraped_at": "2024-06-02T10:00:00Z"},
    {"city": "Utrecht"}
]}"#;

#[test]
fn test_full_run_with_database_and_csv() {
    let dir = tempdir().unwrap();
    let first = write(dir.path(), "first.json", FIRST_DUMP);
    let second = write(dir.path(), "second.json", SECOND_DUMP);

    let mut config = config(dir.path());
    config.database = Some(dir.path().join("db").join("schools.db"));
    config.csv = Some(dir.path().join("schools.csv"));

    let args = IngestArgs {
        inputs: vec![first, second],
        ..IngestArgs::default()
    };
    let report = ingest(&config, &args);

    assert_eq!(report.stats.received, 5);
    assert_eq!(report.stats.created, 3);
    assert_eq!(report.stats.merged, 1);
    assert_eq!(report.stats.rejected, 1);
    assert_eq!(report.stats.dropped_fields, 1);
    assert_eq!(report.exit_code(), ExitCode::PartialSuccess);
    assert_eq!(report.coverage.total, 3);
    assert_eq!(report.coverage.unique_cities, 2);

    let backup = Backup::load(&report.backup).unwrap();
    let jansen = backup
        .records
        .iter()
        .find(|r| r.city() == "Utrecht" && r.name() == "Rijschool Jansen")
        .unwrap();
    assert_eq!(jansen.record.address.as_deref(), Some("Kerkstraat 1a"));
    assert_eq!(jansen.record.phone.as_deref(), Some("030-1234567"));
    assert_eq!(jansen.record.review_count, Some(17));
    assert_eq!(jansen.record.courses.len(), 3);

    let de_vries = backup.records.iter().find(|r| r.name() == "Autorijschool De Vries").unwrap();
    assert_eq!(de_vries.record.email, None);

    assert_eq!(report.persisted.unwrap().inserted, 3);
    assert_eq!(SqliteStore::open(config.database.as_ref().unwrap()).unwrap().count().unwrap(), 3);

    let csv = fs::read_to_string(config.csv.as_ref().unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 4);
}

#[test]
fn test_resume_keeps_ids_and_merges_into_restored() {
    let dir = tempdir().unwrap();
    let first = write(dir.path(), "first.json", FIRST_DUMP);
    let config = config(dir.path());

    let run1 = ingest(
        &config,
        &IngestArgs {
            inputs: vec![first],
            ..IngestArgs::default()
        },
    );
    assert_eq!(run1.coverage.total, 3);

    // Distinct output dir so the second backup cannot collide on the timestamp name.
    let mut config2 = config.clone();
    config2.output_dir = dir.path().join("data2");
    let second = write(dir.path(), "second.json", SECOND_DUMP);
    let run2 = ingest(
        &config2,
        &IngestArgs {
            inputs: vec![second],
            resume: Some(run1.backup.clone()),
            ..IngestArgs::default()
        },
    );

    assert_eq!(run2.restored, 3);
    assert_eq!(run2.stats.received, 2);
    assert_eq!(run2.stats.created, 0);
    assert_eq!(run2.stats.merged, 1);
    assert_eq!(run2.coverage.total, 3);

    let before = Backup::load(&run1.backup).unwrap().records;
    let after = Backup::load(&run2.backup).unwrap().records;
    let ids = |records: &[rijdupe::record::CanonicalRecord]| {
        records.iter().map(|r| r.id).collect::<Vec<_>>()
    };
    assert_eq!(ids(&before), ids(&after));
}

#[test]
fn test_resume_from_tampered_backup_fails() {
    let dir = tempdir().unwrap();
    let first = write(dir.path(), "first.json", FIRST_DUMP);
    let config = config(dir.path());
    let run = ingest(
        &config,
        &IngestArgs {
            inputs: vec![first.clone()],
            ..IngestArgs::default()
        },
    );

    let text = fs::read_to_string(&run.backup).unwrap().replace("Damrak 10", "Damrak 11");
    fs::write(&run.backup, text).unwrap();

    let err = run_ingest(
        &config,
        &IngestArgs {
            inputs: vec![first],
            resume: Some(run.backup.clone()),
            ..IngestArgs::default()
        },
        &ShutdownHandler::new(),
        &Progress::new(true),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("checksum"));
}

#[test]
fn test_unreadable_input_is_skipped() {
    let dir = tempdir().unwrap();
    let good = write(dir.path(), "good.json", FIRST_DUMP);
    let bad = write(dir.path(), "bad.json", "{ not json");

    let report = ingest(
        &config(dir.path()),
        &IngestArgs {
            inputs: vec![bad.clone(), good],
            ..IngestArgs::default()
        },
    );
    assert_eq!(report.failed_sources, vec![bad]);
    assert_eq!(report.stats.created, 3);
}

#[test]
fn test_source_label_and_city_inference() {
    let dir = tempdir().unwrap();
    let input = write(
        dir.path(),
        "listing.jsonl",
        concat!(
            r#"{"name": "Rijschool Pietersen", "url": "https://www.rijscholen.nl/rijscholen/den-haag/pietersen"}"#,
            "\n"
        ),
    );
    let mut config = config(dir.path());
    config.engine.infer_city_from_url = true;

    let report = ingest(
        &config,
        &IngestArgs {
            inputs: vec![input],
            source_label: Some("rijscholen.nl".into()),
            ..IngestArgs::default()
        },
    );
    assert_eq!(report.stats.created, 1);
    assert_eq!(report.exit_code(), ExitCode::Success);

    let record = Backup::load(&report.backup).unwrap().records.remove(0);
    assert_eq!(record.record.source.as_deref(), Some("rijscholen.nl"));
    assert_eq!(record.city(), "Den Haag");
}

#[test]
fn test_nothing_accepted() {
    let dir = tempdir().unwrap();
    let input = write(dir.path(), "empty.json", r#"[{"name": "  "}, {}]"#);
    let report = ingest(
        &config(dir.path()),
        &IngestArgs {
            inputs: vec![input],
            ..IngestArgs::default()
        },
    );
    assert_eq!(report.stats.rejected, 2);
    assert_eq!(report.exit_code(), ExitCode::NoRecords);
}
