//! Progress reporting for batch ingest, using indicatif.

use std::sync::{Mutex, PoisonError};

use indicatif::{ProgressBar, ProgressStyle};

/// Receives progress updates from the ingest loop.
pub trait ProgressCallback: Send + Sync {
    /// A source is about to be ingested; `total` is its record count.
    fn on_source_start(&self, source: &str, total: usize);

    /// One record of the current source was handled.
    fn on_record(&self, current: usize);

    /// The current source is done (or the run was interrupted).
    fn on_source_end(&self, source: &str);

    /// Free-form status line.
    fn on_message(&self, _message: &str) {}
}

/// Terminal progress bar, one per source.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a reporter. With `quiet` nothing is drawn.
    ///
    /// ```
    /// use rijdupe::progress::{Progress, ProgressCallback};
    ///
    /// let progress = Progress::new(true);
    /// progress.on_source_start("listings.json", 10);
    /// progress.on_record(1);
    /// progress.on_source_end("listings.json");
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bar) = guard.as_ref() {
            f(bar);
        }
    }
}

impl ProgressCallback for Progress {
    fn on_source_start(&self, source: &str, total: usize) {
        if self.quiet {
            return;
        }
        let bar = ProgressBar::new(total as u64);
        bar.set_style(Self::style());
        bar.set_message(source.to_string());
        *self.bar.lock().unwrap_or_else(PoisonError::into_inner) = Some(bar);
    }

    fn on_record(&self, current: usize) {
        self.with_bar(|bar| bar.set_position(current as u64));
    }

    fn on_source_end(&self, source: &str) {
        if let Some(bar) = self.bar.lock().unwrap_or_else(PoisonError::into_inner).take() {
            bar.finish_with_message(format!("{source} done"));
        }
    }

    fn on_message(&self, message: &str) {
        self.with_bar(|bar| bar.set_message(message.to_string()));
    }
}
