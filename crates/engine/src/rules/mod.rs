//! The rule set: a trait with one required hook and two optional lifecycle
//! hooks, plus the built-in rules.
//!
//! Rules receive the reporting capability as an explicit parameter instead
//! of holding a back-reference to the engine, so every rule variant is a
//! plain concrete type. Accumulator state lives inside each rule behind a
//! mutex; `on_process` must tolerate concurrent invocation across different
//! files (monotonic accumulation only).

pub mod dupe_finder;
pub mod generic_grep;
pub mod initializable;
pub mod stats;

pub use dupe_finder::DupeFinder;
pub use generic_grep::GenericGrep;
pub use initializable::{IsInitializable, IsMultipleBalanceOfSameFunc};
pub use stats::Stats;

use anyhow::Result;

use crate::runner::Reporter;
use crate::solidity::SourceUnit;

pub trait Rule: Send + Sync {
    /// Rule identity as recorded in findings: the concrete type name.
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "N/A"
    }

    /// Called once per successfully parsed source unit, in registration
    /// order. An error here is recorded against the file being processed and
    /// does not stop the run.
    fn on_process(&self, unit: &SourceUnit, reporter: &Reporter<'_>) -> Result<()>;

    /// Called after every file of a directory has been processed.
    fn on_dir_analyzed(&self, _reporter: &Reporter<'_>) {}

    /// Called once at the very end of a run.
    fn on_close(&self, _reporter: &Reporter<'_>) {}
}

/// The rule set installed when the caller supplies none.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(IsInitializable::new()),
        Box::new(IsMultipleBalanceOfSameFunc::new()),
        Box::new(Stats::new()),
    ]
}

/// Look up a built-in rule by name, for host rule selection.
pub fn builtin(name: &str) -> Option<Box<dyn Rule>> {
    match name {
        "Stats" => Some(Box::new(Stats::new())),
        "DupeFinder" => Some(Box::new(DupeFinder::new())),
        "IsInitializable" => Some(Box::new(IsInitializable::new())),
        "IsMultipleBalanceOfSameFunc" => Some(Box::new(IsMultipleBalanceOfSameFunc::new())),
        _ => None,
    }
}

/// Name/description pairs of every built-in rule, for `--list-rules`.
pub fn builtin_descriptions() -> Vec<(&'static str, &'static str)> {
    let rules: Vec<Box<dyn Rule>> = vec![
        Box::new(Stats::new()),
        Box::new(DupeFinder::new()),
        Box::new(IsInitializable::new()),
        Box::new(IsMultipleBalanceOfSameFunc::new()),
    ];
    rules.iter().map(|r| (r.id(), r.description())).collect()
}
