//! Solgrep Engine - Semantic Grep for Solidity
//!
//! This crate parses Solidity sources into a lightweight semantic model
//! (source units, contracts, functions, modifiers) and runs a set of rules
//! over it: built-in analyses such as corpus statistics and duplicate
//! detection, plus user-supplied match patterns evaluated by a small
//! whitelisted expression interpreter. Patterns cannot call into the host;
//! only the accessors listed in [`pattern`] are reachable.

pub mod core;
pub mod hashing;
pub mod pattern;
pub mod rules;
pub mod runner;
pub mod solidity;
pub mod util;

pub use crate::core::{EngineError, FileError, Finding, FindingSink, GENERAL_KEY};

pub use hashing::{hash_contract, HashMode, HASH_MODES};

pub use rules::{
    builtin, builtin_descriptions, default_rules, DupeFinder, GenericGrep, IsInitializable,
    IsMultipleBalanceOfSameFunc, Rule, Stats,
};

pub use runner::{EngineConfig, NullObserver, Observer, Reporter, SolGrep};

pub use solidity::{Contract, ContractKind, FunctionDef, SourceLocation, SourceUnit};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
