//! Engine error taxonomy.
//!
//! Four classes of failure exist, with different blast radii:
//!
//! - `Io` / `Parse`: the file could not be read or the parser produced no
//!   tree. Recorded per file, the run continues.
//! - `ModelIntegrity`: the parse tree had a shape the domain model does not
//!   recognize (e.g. an unknown contract kind from a newer grammar). Fatal to
//!   that file, caught at the engine boundary like any other per-file error.
//! - `InvalidPattern`: a grep pattern failed validation at registration.
//!   This is the only class that aborts a run, since the rule set is fixed
//!   before any file is processed.
//! - `Rule`: a rule hook returned an error while processing one file.
//!   Recorded per file, the run continues.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("model integrity: {0}")]
    ModelIntegrity(String),

    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("rule `{rule}` failed: {source}")]
    Rule {
        rule: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// A per-file failure recorded during a run. The run itself always completes;
/// callers inspect this list separately from the findings map to judge run
/// health.
#[derive(Debug)]
pub struct FileError {
    pub file: PathBuf,
    pub error: EngineError,
}
