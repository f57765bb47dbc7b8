//! Application driver behind the `rijdupe` binary.
//!
//! [`run_app`] wires logging, configuration and the Ctrl+C hook around the
//! subcommands. The ingest pipeline itself is [`run_ingest`], which takes
//! everything it needs as arguments and can be driven from tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::Utc;

use crate::cli::{Cli, Commands, ConfigArgs, IngestArgs, StatsArgs};
use crate::config::Config;
use crate::duplicates::{DeduplicationEngine, IngestStats};
use crate::error::ExitCode;
use crate::logging::init_logging;
use crate::output::{backup, Backup, CsvOutput, JsonOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::signal::{install_handler, ShutdownHandler};
use crate::source::{JsonFileSource, RecordSource};
use crate::store::{CoverageStats, PersistSummary, SqliteStore};

/// What an ingest run did.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Counters for records read in this run (restored records excluded).
    pub stats: IngestStats,
    /// Records seeded from `--resume`.
    pub restored: usize,
    /// Inputs that could not be read.
    pub failed_sources: Vec<PathBuf>,
    pub coverage: CoverageStats,
    pub backup: PathBuf,
    pub persisted: Option<PersistSummary>,
    pub csv: Option<PathBuf>,
    pub interrupted: bool,
    pub duration: Duration,
}

impl IngestReport {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_batch(&self.stats, self.interrupted)
    }
}

/// Run the parsed command line.
///
/// # Errors
///
/// Any failure that prevents the command from completing.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Ingest(ref args) => {
            let mut config = Config::load(cli.config.as_deref())?;
            config.apply_ingest_args(args);
            config.validate()?;

            let shutdown = install_handler().unwrap_or_else(|e| {
                log::warn!("{e}; Ctrl+C will abort without saving");
                ShutdownHandler::new()
            });
            let progress = Progress::new(cli.quiet || args.json_summary);

            let report = run_ingest(&config, args, &shutdown, &progress)?;
            let exit_code = report.exit_code();

            if args.json_summary {
                JsonOutput::new(
                    report.stats,
                    report.coverage,
                    Some(report.backup.as_path()),
                    report.duration,
                    report.interrupted,
                    exit_code,
                )
                .write_to(&mut io::stdout().lock(), true)?;
            } else if !cli.quiet {
                print_report(&report);
            }
            Ok(exit_code)
        }
        Commands::Stats(ref args) => run_stats(args),
        Commands::Config(ref args) => run_config(cli.config.as_deref(), args),
    }
}

/// Read every input, deduplicate, then write the backup and the optional
/// database and CSV outputs.
///
/// An interrupted run still saves everything ingested so far. An unreadable
/// input is logged and skipped unless no input could be read at all.
///
/// # Errors
///
/// Fails when `--resume` cannot be loaded, when every input fails, or when
/// an output cannot be written.
pub fn run_ingest(
    config: &Config,
    args: &IngestArgs,
    shutdown: &ShutdownHandler,
    progress: &dyn ProgressCallback,
) -> Result<IngestReport> {
    let started = Instant::now();
    let mut engine = DeduplicationEngine::new(config.engine);

    let restored = match &args.resume {
        Some(path) => {
            let backup = Backup::load(path)
                .with_context(|| format!("Failed to resume from {}", path.display()))?;
            let added = engine.restore(backup.records);
            log::info!("Resumed {added} records from {}", path.display());
            added
        }
        None => 0,
    };

    let mut failed_sources = Vec::new();
    let mut interrupted = false;

    for input in &args.inputs {
        if shutdown.is_shutdown_requested() {
            interrupted = true;
            break;
        }

        let mut source = JsonFileSource::new(input);
        if let Some(label) = &args.source_label {
            source = source.with_default_source(label.clone());
        }

        let records = match source.fetch() {
            Ok(records) => records,
            Err(e) => {
                log::error!("{e}");
                failed_sources.push(input.clone());
                continue;
            }
        };

        log::info!("Ingesting {} records from {}", records.len(), source.name());
        progress.on_source_start(source.name(), records.len());
        for (i, raw) in records.into_iter().enumerate() {
            if shutdown.is_shutdown_requested() {
                interrupted = true;
                break;
            }
            engine.ingest(raw);
            progress.on_record(i + 1);
        }
        progress.on_source_end(source.name());

        if interrupted {
            log::warn!("Interrupted while reading {}", source.name());
            break;
        }
    }

    if !args.inputs.is_empty() && failed_sources.len() == args.inputs.len() {
        bail!("None of the {} input(s) could be read", args.inputs.len());
    }

    let stats = engine.stats();
    let records = engine.records();

    let backup = backup::write_backup(&config.output_dir, records, Utc::now())
        .context("Failed to write backup")?;

    let persisted = match &config.database {
        Some(path) => {
            let mut store = SqliteStore::open(path)
                .with_context(|| format!("Failed to open database {}", path.display()))?;
            Some(store.persist(records).context("Failed to persist records")?)
        }
        None => None,
    };

    let csv = match &config.csv {
        Some(path) => {
            write_csv(path, records)?;
            Some(path.clone())
        }
        None => None,
    };

    Ok(IngestReport {
        stats,
        restored,
        failed_sources,
        coverage: CoverageStats::from_records(records),
        backup,
        persisted,
        csv,
        interrupted,
        duration: started.elapsed(),
    })
}

fn write_csv(path: &Path, records: &[crate::record::CanonicalRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    CsvOutput::new(records)
        .write_to(io::BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

fn print_report(report: &IngestReport) {
    let s = &report.stats;
    println!("Records read:     {}", s.received);
    println!("  new schools:    {}", s.created);
    println!("  merged:         {}", s.merged);
    println!("  repeats:        {}", s.unchanged);
    println!("  rejected:       {}", s.rejected);
    println!("  fields dropped: {}", s.dropped_fields);
    if report.restored > 0 {
        println!("Resumed:          {}", report.restored);
    }
    for path in &report.failed_sources {
        println!("Unreadable input: {}", path.display());
    }
    println!();
    println!("{}", report.coverage);
    println!();
    println!("Backup: {}", report.backup.display());
    if let Some(p) = report.persisted {
        println!("Database: {} new, {} updated", p.inserted, p.updated);
    }
    if let Some(csv) = &report.csv {
        println!("CSV: {}", csv.display());
    }
    if report.interrupted {
        println!("Run was interrupted; partial results saved.");
    }
    println!("Done in {:.2}s", report.duration.as_secs_f64());
}

fn run_stats(args: &StatsArgs) -> Result<ExitCode> {
    let records = match (&args.backup, &args.db) {
        (Some(path), _) => {
            Backup::load(path)
                .with_context(|| format!("Failed to read backup {}", path.display()))?
                .records
        }
        (None, Some(path)) => SqliteStore::open(path)
            .and_then(|store| store.load_all())
            .with_context(|| format!("Failed to read database {}", path.display()))?,
        (None, None) => bail!("Nothing to report on: pass a backup file or --db"),
    };

    let coverage = CoverageStats::from_records(&records);
    println!("{coverage}");
    Ok(if coverage.total == 0 {
        ExitCode::NoRecords
    } else {
        ExitCode::Success
    })
}

fn run_config(path: Option<&Path>, args: &ConfigArgs) -> Result<ExitCode> {
    if !args.init {
        let config = Config::load(path)?;
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(ExitCode::Success);
    }

    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::default_path()?,
    };
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default().save(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(ExitCode::Success)
}
