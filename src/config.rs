//! Application configuration management.
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config PATH`, or `config.toml` in the platform config
//!    directory)
//! 3. `RIJDUPE_*` environment variables, nested with `__`
//!    (`RIJDUPE_ENGINE__MERGE_THRESHOLD=0.85`)
//! 4. Command-line flags (see [`Config::apply_ingest_args`])

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::IngestArgs;
use crate::duplicates::{SimilarityWeights, DEFAULT_MERGE_THRESHOLD};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "RIJDUPE_";

/// Errors from loading or checking configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("merge_threshold must lie in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("weight '{name}' must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("at least one of the name and city weights must be positive")]
    ZeroWeights,

    #[error("Failed to determine project directories")]
    NoConfigDir,

    #[error("Failed to write configuration to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Settings handed to [`crate::duplicates::DeduplicationEngine::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Similarity at or above which two records merge.
    pub merge_threshold: f64,
    /// Take the city from a `/rijscholen/<city>/` listing url when missing.
    pub infer_city_from_url: bool,
    pub weights: SimilarityWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
            infer_city_from_url: false,
            weights: SimilarityWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Check threshold and weights.
    ///
    /// # Errors
    ///
    /// See [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.merge_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(ConfigError::InvalidThreshold(t));
        }
        let w = self.weights;
        for (name, value) in [("name", w.name), ("address", w.address), ("city", w.city)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        // The address term may be absent, so it cannot carry the score alone.
        if w.name + w.city <= 0.0 {
            return Err(ConfigError::ZeroWeights);
        }
        Ok(())
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for JSON backups.
    pub output_dir: PathBuf,
    /// SQLite database to upsert into, if any.
    pub database: Option<PathBuf>,
    /// CSV export path, if any.
    pub csv: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            database: None,
            csv: None,
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML, mistyped values or failed validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().ok(),
        };
        Self::load_from(Self::figment(path.as_deref()))
    }

    /// The provider stack used by [`Config::load`].
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a configuration from any figment.
    ///
    /// # Errors
    ///
    /// Fails on extraction or validation errors.
    pub fn load_from(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check every setting.
    ///
    /// # Errors
    ///
    /// See [`EngineConfig::validate`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()
    }

    /// Override settings with command-line flags.
    pub fn apply_ingest_args(&mut self, args: &IngestArgs) {
        if let Some(dir) = &args.output_dir {
            self.output_dir.clone_from(dir);
        }
        if let Some(db) = &args.db {
            self.database = Some(db.clone());
        }
        if let Some(csv) = &args.csv {
            self.csv = Some(csv.clone());
        }
        if let Some(threshold) = args.threshold {
            self.engine.merge_threshold = threshold;
        }
        if args.infer_city {
            self.engine.infer_city_from_url = true;
        }
    }

    /// Write the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Fails if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Platform-specific default configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoConfigDir`] when no home directory can be found.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("nl", "rijdupe", "rijdupe").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}
