//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! The level is chosen, in priority order, from:
//!
//! 1. `RIJDUPE_LOG`, then `RUST_LOG` (full `env_logger` filter syntax)
//! 2. `-q` (errors only) or `-v`/`-vv` (debug/trace)
//! 3. Info
//!
//! Debug builds prefix each line with a timestamp; verbose runs add the
//! module path. Release builds print level and message only.
//!
//! ```rust,no_run
//! use rijdupe::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible");
//! ```

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Application-specific filter variable; wins over `RUST_LOG`.
pub const LOG_ENV: &str = "RIJDUPE_LOG";

/// Initialize logging from CLI verbosity.
///
/// Calling it twice is harmless: the second call keeps the first logger.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    let filter = env_filter();
    match &filter {
        Some(spec) => {
            builder.parse_filters(spec);
        }
        None => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }

    match filter {
        Some(spec) => log::debug!("Logging filter from environment: {spec}"),
        None => log::debug!("Logging at level {}", determine_level(verbose, quiet)),
    }
}

fn env_filter() -> Option<String> {
    [LOG_ENV, "RUST_LOG"]
        .into_iter()
        .find_map(|key| env::var(key).ok())
        .filter(|spec| !spec.trim().is_empty())
}

/// Level from CLI flags; `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            let timestamp = buf.timestamp_seconds();
            if verbose >= 1 {
                writeln!(
                    buf,
                    "{timestamp} {style}{level:<5}{style:#} [{}] {}",
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(buf, "{timestamp} {style}{level:<5}{style:#} {}", record.args())
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            writeln!(buf, "{style}{level:<5}{style:#} {}", record.args())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determine_level() {
        assert_eq!(determine_level(0, false), LevelFilter::Info);
        assert_eq!(determine_level(1, false), LevelFilter::Debug);
        assert_eq!(determine_level(2, false), LevelFilter::Trace);
        assert_eq!(determine_level(7, false), LevelFilter::Trace);
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        assert_eq!(determine_level(2, true), LevelFilter::Error);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging(0, true);
        init_logging(2, false);
    }
}
