//! Rule execution and orchestration.
//!
//! The engine owns the active rule set, the per-file work queue and the
//! finding sink, and drives the three lifecycle phases: per-unit
//! (`on_process`), per-directory-completion (`on_dir_analyzed`) and
//! run-completion (`on_close`). Per-file failures are isolated: one broken
//! file never aborts the run.

pub mod engine;
pub mod observer;

pub use engine::{EngineConfig, Reporter, SolGrep};
pub use observer::{NullObserver, Observer};
