//! Reporter trait for dependency injection
//!
//! Core install logic reports progress through this trait so it is not
//! coupled to a terminal. The CLI supplies a styled implementation; tests
//! and `--quiet` runs use [`NullReporter`] or [`RecordingReporter`].

use std::sync::Mutex;

use tap_schema::{FormulaName, Version};

/// Progress and status sink for install operations.
pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Fetching", "Installing").
    fn section(&self, title: &str);

    /// Updates the progress of a download.
    fn downloading(&self, name: &FormulaName, version: &Version, current: u64, total: Option<u64>);

    /// Signals that the archive is being extracted.
    fn extracting(&self, name: &FormulaName, version: &Version);

    /// Signals that files are being copied into the binary directory.
    fn installing(&self, name: &FormulaName, version: &Version);

    /// Signals that installed files are being deleted.
    fn removing(&self, name: &FormulaName, version: &Version);

    /// Marks an operation as successfully completed.
    fn done(&self, name: &FormulaName, version: &Version, detail: &str, size: Option<u64>);

    /// Marks an operation as failed with a specific reason.
    fn failed(&self, name: &FormulaName, version: &Version, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message (used for caveats).
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn downloading(&self, name: &FormulaName, version: &Version, current: u64, total: Option<u64>) {
        (**self).downloading(name, version, current, total);
    }
    fn extracting(&self, name: &FormulaName, version: &Version) {
        (**self).extracting(name, version);
    }
    fn installing(&self, name: &FormulaName, version: &Version) {
        (**self).installing(name, version);
    }
    fn removing(&self, name: &FormulaName, version: &Version) {
        (**self).removing(name, version);
    }
    fn done(&self, name: &FormulaName, version: &Version, detail: &str, size: Option<u64>) {
        (**self).done(name, version, detail, size);
    }
    fn failed(&self, name: &FormulaName, version: &Version, reason: &str) {
        (**self).failed(name, version, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
}

/// A no-op reporter for silent operations (e.g., verification, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn downloading(&self, _: &FormulaName, _: &Version, _: u64, _: Option<u64>) {}
    fn extracting(&self, _: &FormulaName, _: &Version) {}
    fn installing(&self, _: &FormulaName, _: &Version) {}
    fn removing(&self, _: &FormulaName, _: &Version) {}
    fn done(&self, _: &FormulaName, _: &Version, _: &str, _: Option<u64>) {}
    fn failed(&self, _: &FormulaName, _: &Version, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
}

/// Keeps warnings and failures in memory so callers can assert on them.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    warnings: Mutex<Vec<String>>,
    failures: Mutex<Vec<String>>,
}

impl RecordingReporter {
    /// Warnings seen so far.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Failure reasons seen so far.
    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn section(&self, _: &str) {}
    fn downloading(&self, _: &FormulaName, _: &Version, _: u64, _: Option<u64>) {}
    fn extracting(&self, _: &FormulaName, _: &Version) {}
    fn installing(&self, _: &FormulaName, _: &Version) {}
    fn removing(&self, _: &FormulaName, _: &Version) {}
    fn done(&self, _: &FormulaName, _: &Version, _: &str, _: Option<u64>) {}
    fn failed(&self, _: &FormulaName, _: &Version, reason: &str) {
        if let Ok(mut f) = self.failures.lock() {
            f.push(reason.to_string());
        }
    }
    fn info(&self, _: &str) {}
    fn warning(&self, msg: &str) {
        if let Ok(mut w) = self.warnings.lock() {
            w.push(msg.to_string());
        }
    }
    fn error(&self, _: &str) {}
}
