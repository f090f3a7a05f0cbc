//! The orchestrator.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::core::{EngineError, FileError, Finding, FindingSink, GENERAL_KEY};
use crate::rules::{default_rules, Rule};
use crate::runner::observer::{NullObserver, Observer};
use crate::solidity::{SourceLocation, SourceUnit};
use crate::util;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Process files on the rayon pool; disable for strictly sequential,
    /// deterministically ordered runs.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

type FileFilter = dyn Fn(&Path) -> bool + Send + Sync;

/// The reporting capability handed to rule hooks. This is the only path by
/// which rules mutate shared state; it is safe to call concurrently from
/// workers processing different files.
pub struct Reporter<'a> {
    sink: &'a FindingSink,
    observer: &'a dyn Observer,
}

impl Reporter<'_> {
    /// Append a finding under the unit's file key, or under the global key
    /// when no unit is given (aggregate findings).
    pub fn report(
        &self,
        unit: Option<&SourceUnit>,
        rule: &str,
        tag: &str,
        info: serde_json::Value,
        loc: Option<SourceLocation>,
    ) {
        let key = match unit {
            Some(unit) => unit.file_key(),
            None => GENERAL_KEY.to_string(),
        };
        let finding = Finding {
            rule: rule.to_string(),
            tag: tag.to_string(),
            info,
            loc,
        };
        self.observer.on_report(&key, &finding);
        self.sink.push(key, finding);
    }
}

/// Semantic grep over a Solidity source tree: enumerates files, parses each
/// into a [`SourceUnit`], runs every rule's `on_process` hook against the
/// model and aggregates findings keyed by file.
///
/// One engine instance accumulates combined state across multiple `analyze`
/// calls by design; use separate instances for independent scans.
pub struct SolGrep {
    rules: Vec<Box<dyn Rule>>,
    observer: Box<dyn Observer>,
    config: EngineConfig,
    file_filter: Box<FileFilter>,
    sink: FindingSink,
    errors: Mutex<Vec<FileError>>,
    total_files: AtomicUsize,
}

impl SolGrep {
    /// Create an engine with the given rule set. An empty list installs the
    /// default rules.
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        let rules = if rules.is_empty() {
            default_rules()
        } else {
            rules
        };
        Self {
            rules,
            observer: Box::new(NullObserver),
            config: EngineConfig::default(),
            file_filter: Box::new(util::is_solidity_file),
            sink: FindingSink::new(),
            errors: Mutex::new(Vec::new()),
            total_files: AtomicUsize::new(0),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the candidate-file predicate (default: `.sol` extension).
    pub fn with_file_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        self.file_filter = Box::new(filter);
        self
    }

    /// Analyze every candidate file under `target` (a directory or a single
    /// file). Per-file failures are recorded, not propagated; the only error
    /// here is failing to enumerate the target at all.
    pub fn analyze(&self, target: &Path) -> Result<(), EngineError> {
        let files = util::list_files(target, self.file_filter.as_ref())?;
        debug!(target = %target.display(), files = files.len(), "starting analysis");
        self.observer.on_analyze_dir(target, files.len());

        if self.config.parallel {
            files.par_iter().for_each(|file| self.process_file(file));
        } else {
            for file in &files {
                self.process_file(file);
            }
        }

        // full drain barrier: every file is done before the dir hooks run
        self.observer.on_dir_analyzed(target);
        let reporter = self.reporter();
        for rule in &self.rules {
            rule.on_dir_analyzed(&reporter);
        }
        Ok(())
    }

    fn process_file(&self, file: &Path) {
        self.observer.on_file(file);
        self.total_files.fetch_add(1, Ordering::Relaxed);
        match self.try_process(file) {
            Ok(()) => self.observer.on_file_ok(file),
            Err(error) => {
                warn!(file = %file.display(), %error, "file analysis failed");
                self.observer.on_file_error(file, &error);
                self.errors.lock().push(FileError {
                    file: file.to_path_buf(),
                    error,
                });
            }
        }
    }

    /// The single per-file failure boundary: parse errors, model-integrity
    /// errors and rule failures all surface here and are isolated to this
    /// file.
    fn try_process(&self, file: &Path) -> Result<(), EngineError> {
        let unit = SourceUnit::from_file(file)?;
        let reporter = self.reporter();
        for rule in &self.rules {
            rule.on_process(&unit, &reporter)
                .map_err(|source| EngineError::Rule {
                    rule: rule.id(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Run-completion: notifies the observer, then every rule's `on_close`
    /// (final aggregate reporting).
    pub fn close(&self) {
        self.observer.on_close();
        let reporter = self.reporter();
        for rule in &self.rules {
            rule.on_close(&reporter);
        }
    }

    fn reporter(&self) -> Reporter<'_> {
        Reporter {
            sink: &self.sink,
            observer: self.observer.as_ref(),
        }
    }

    /// Snapshot of the findings map (`file key -> findings`).
    pub fn findings(&self) -> HashMap<String, Vec<Finding>> {
        self.sink.snapshot()
    }

    /// The findings map serialized exactly as stored.
    pub fn findings_json(&self) -> serde_json::Result<String> {
        self.sink.to_json()
    }

    pub fn total_findings(&self) -> usize {
        self.sink.total()
    }

    pub fn total_files(&self) -> usize {
        self.total_files.load(Ordering::Relaxed)
    }

    /// Per-file failures recorded so far, as `(file, message)` pairs.
    pub fn errors(&self) -> Vec<(PathBuf, String)> {
        self.errors
            .lock()
            .iter()
            .map(|e| (e.file.clone(), e.error.to_string()))
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().len()
    }
}
