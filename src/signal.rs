//! Ctrl+C handling for batch runs.
//!
//! The handler only flips a shared flag. The ingest loop checks it between
//! records, stops taking new ones and still writes everything ingested so
//! far before exiting with code 130.
//!
//! ```rust,no_run
//! use rijdupe::signal::install_handler;
//!
//! let shutdown = install_handler().expect("signal handler");
//! while !shutdown.is_shutdown_requested() {
//!     // ingest the next record
//!     # break;
//! }
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// A handler with no shutdown requested and no signal hook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The underlying flag, for code that only wants an `AtomicBool`.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

/// Install the process-wide Ctrl+C hook, once.
///
/// Later calls return the same handler with its flag reset, so repeated runs
/// in one process (tests) each start clean.
///
/// # Errors
///
/// [`SignalError::InstallFailed`] when a hook was registered by someone else.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Finishing current record and saving...");
        let _ = stderr.flush();
    })?;

    Ok(GLOBAL_HANDLER.get_or_init(|| handler).clone())
}
