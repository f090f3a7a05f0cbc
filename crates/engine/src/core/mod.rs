//! Core types shared across the engine: error taxonomy, findings and the
//! finding sink.

pub mod error;
pub mod finding;

pub use error::{EngineError, FileError};
pub use finding::{Finding, FindingSink, GENERAL_KEY};
