//! Configuration layering: defaults, TOML file, environment, CLI flags.

use clap::Parser;
use rijdupe::cli::{Cli, Commands};
use rijdupe::config::{Config, ConfigError};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all RIJDUPE_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("RIJDUPE_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_missing_file_gives_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();

    let config = Config::load(Some(dir.path().join("absent.toml").as_path())).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_toml_file_overrides_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
output_dir = "backups"
database = "schools.db"

[engine]
merge_threshold = 0.9
infer_city_from_url = true

[engine.weights]
name = 0.6
"#,
    )
    .unwrap();

    let config = Config::load(Some(path.as_path())).unwrap();
    assert_eq!(config.output_dir, PathBuf::from("backups"));
    assert_eq!(config.database, Some(PathBuf::from("schools.db")));
    assert_eq!(config.engine.merge_threshold, 0.9);
    assert!(config.engine.infer_city_from_url);
    assert_eq!(config.engine.weights.name, 0.6);
    // Unset weights keep their defaults.
    assert_eq!(config.engine.weights.address, 0.3);
    assert_eq!(config.engine.weights.city, 0.2);
}

#[test]
fn test_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[engine]\nmerge_threshold = 0.9\n").unwrap();

    std::env::set_var("RIJDUPE_ENGINE__MERGE_THRESHOLD", "0.75");
    std::env::set_var("RIJDUPE_OUTPUT_DIR", "/tmp/rijdupe-out");
    let config = Config::load(Some(path.as_path()));
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.engine.merge_threshold, 0.75);
    assert_eq!(config.output_dir, PathBuf::from("/tmp/rijdupe-out"));
}

#[test]
fn test_cli_flags_override_everything() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    std::env::set_var("RIJDUPE_ENGINE__MERGE_THRESHOLD", "0.75");
    let dir = tempdir().unwrap();
    let mut config = Config::load(Some(dir.path().join("absent.toml").as_path())).unwrap();
    clear_env();

    let cli = Cli::try_parse_from([
        "rijdupe",
        "ingest",
        "dump.json",
        "--threshold",
        "0.95",
        "--db",
        "other.db",
        "--output-dir",
        "elsewhere",
        "--infer-city",
    ])
    .unwrap();
    let Commands::Ingest(args) = cli.command else {
        panic!("expected ingest");
    };
    config.apply_ingest_args(&args);

    assert_eq!(config.engine.merge_threshold, 0.95);
    assert_eq!(config.database, Some(PathBuf::from("other.db")));
    assert_eq!(config.output_dir, PathBuf::from("elsewhere"));
    assert!(config.engine.infer_city_from_url);
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_threshold_in_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[engine]\nmerge_threshold = 1.5\n").unwrap();

    assert!(matches!(
        Config::load(Some(path.as_path())),
        Err(ConfigError::InvalidThreshold(t)) if t == 1.5
    ));
}

#[test]
fn test_mistyped_value_is_a_load_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[engine]\nmerge_threshold = \"high\"\n").unwrap();

    let err = Config::load(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_save_then_load() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.engine.merge_threshold = 0.85;
    config.csv = Some(PathBuf::from("out.csv"));
    config.save(&path).unwrap();

    assert_eq!(Config::load(Some(path.as_path())).unwrap(), config);
}
