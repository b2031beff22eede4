//! Mapping of per-entry progress onto overall stage percentages.
//!
//! The copy loop owns the 10%..40% band and the archive loop the 70%..80%
//! band. [`StageProgress`] turns `on_entry_start(current, total)` into a
//! percentage inside its band and forwards it to the observer.

use crate::AssemblyObserver;
use crate::LogLevel;
use crate::ProgressCallback;
use std::path::Path;

/// What a stage reports in its status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// `Copying: <path>`
    Copy,
    /// `Archiving: <current>/<total> entries`
    Archive,
}

/// `ProgressCallback` that reports a percentage band to an observer.
pub struct StageProgress<'a> {
    observer: &'a dyn AssemblyObserver,
    start: f64,
    span: f64,
    kind: StageKind,
    bytes: u64,
}

impl<'a> StageProgress<'a> {
    /// Creates a stage covering `start..end` percent.
    #[must_use]
    pub fn new(observer: &'a dyn AssemblyObserver, start: f64, end: f64, kind: StageKind) -> Self {
        Self {
            observer,
            start,
            span: end - start,
            kind,
            bytes: 0,
        }
    }

    /// Bytes reported through `on_bytes_written` so far.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Percentage for `done` of `total` completed entries.
    #[must_use]
    pub fn percent(&self, done: usize, total: usize) -> f64 {
        self.start + (done as f64 / total.max(1) as f64) * self.span
    }
}

impl ProgressCallback for StageProgress<'_> {
    fn on_entry_start(&mut self, path: &Path, total: usize, current: usize) {
        let percent = self.percent(current.saturating_sub(1), total);
        let status = match self.kind {
            StageKind::Copy => format!("Copying: {}", path.display()),
            StageKind::Archive => format!("Archiving: {current}/{total} entries"),
        };
        self.observer.on_progress(percent, &status);
    }

    fn on_bytes_written(&mut self, bytes: u64) {
        self.bytes += bytes;
    }

    fn on_entry_complete(&mut self, path: &Path) {
        self.observer
            .on_log(LogLevel::Debug, &format!("Done: {}", path.display()));
    }

    fn on_complete(&mut self) {
        self.observer.on_progress(self.start + self.span, "Stage complete");
    }
}
