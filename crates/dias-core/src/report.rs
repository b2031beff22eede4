//! Progress and log notification.
//!
//! Two layers are used during assembly. [`ProgressCallback`] receives
//! per-entry events from the copy and archive loops. [`AssemblyObserver`]
//! receives the user-facing stage percentages and the log trail.

use std::fmt;
use std::path::Path;

/// Callback trait for per-entry progress inside one stage.
///
/// The trait requires `Send` so a stage can run on a worker thread.
///
/// # Examples
///
/// ```
/// use dias_core::ProgressCallback;
/// use std::path::Path;
///
/// struct Printer;
///
/// impl ProgressCallback for Printer {
///     fn on_entry_start(&mut self, path: &Path, total: usize, current: usize) {
///         println!("{current}/{total}: {}", path.display());
///     }
///
///     fn on_bytes_written(&mut self, _bytes: u64) {}
///
///     fn on_entry_complete(&mut self, _path: &Path) {}
///
///     fn on_complete(&mut self) {}
/// }
/// ```
pub trait ProgressCallback: Send {
    /// Called when starting to process an entry.
    ///
    /// * `path` - entry path relative to the stage root
    /// * `total` - number of entries in the stage
    /// * `current` - current entry number (1-indexed)
    fn on_entry_start(&mut self, path: &Path, total: usize, current: usize);

    /// Called as bytes of the current entry are written.
    fn on_bytes_written(&mut self, bytes: u64);

    /// Called when an entry has been processed.
    fn on_entry_complete(&mut self, path: &Path);

    /// Called once when the stage finishes.
    fn on_complete(&mut self);
}

/// `ProgressCallback` that ignores every event.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_entry_start(&mut self, _path: &Path, _total: usize, _current: usize) {}

    fn on_bytes_written(&mut self, _bytes: u64) {}

    fn on_entry_complete(&mut self, _path: &Path) {}

    fn on_complete(&mut self) {}
}

/// Severity of a user-visible log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Normal progress message.
    Info,
    /// Recoverable problem.
    Warning,
    /// Failure.
    Error,
    /// Final success message.
    Success,
    /// Diagnostic detail.
    Debug,
}

impl LogLevel {
    /// Upper-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Success => "SUCCESS",
            Self::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives stage progress and log messages from an assembly run.
///
/// Notifications may arrive on a worker thread. Marshalling them onto a
/// UI thread is the implementor's concern.
pub trait AssemblyObserver: Send + Sync {
    /// Overall progress in percent with a short status text.
    fn on_progress(&self, percent: f64, status: &str);

    /// One entry of the user-visible log trail.
    fn on_log(&self, level: LogLevel, message: &str);
}

/// Observer that discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl AssemblyObserver for NoopObserver {
    fn on_progress(&self, _percent: f64, _status: &str) {}

    fn on_log(&self, _level: LogLevel, _message: &str) {}
}

/// Observer that forwards notifications to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AssemblyObserver for TracingObserver {
    fn on_progress(&self, percent: f64, status: &str) {
        tracing::debug!(percent, status, "progress");
    }

    fn on_log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => tracing::error!("{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Info | LogLevel::Success => tracing::info!("{message}"),
        }
    }
}
