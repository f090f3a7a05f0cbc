//! Progress and lifecycle notifications for hosts (CLI progress lines,
//! error reporting). All methods default to no-ops; implement only what the
//! host cares about.

use std::path::Path;

use crate::core::{EngineError, Finding};

pub trait Observer: Send + Sync {
    /// Directory analysis is starting; `num_files` candidates were found.
    fn on_analyze_dir(&self, _target: &Path, _num_files: usize) {}

    /// A file is about to be processed.
    fn on_file(&self, _file: &Path) {}

    fn on_file_ok(&self, _file: &Path) {}

    fn on_file_error(&self, _file: &Path, _error: &EngineError) {}

    /// A rule reported a finding.
    fn on_report(&self, _key: &str, _finding: &Finding) {}

    /// Every file of the directory has been processed.
    fn on_dir_analyzed(&self, _target: &Path) {}

    fn on_close(&self) {}
}

/// The default observer: silence.
pub struct NullObserver;

impl Observer for NullObserver {}
