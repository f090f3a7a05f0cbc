//! Solidity domain model.
//!
//! One parsed file becomes a [`SourceUnit`]; each top-level declaration
//! becomes a [`Contract`] with its nested declarations classified into
//! buckets (state variables, enums, structs, mappings, modifiers, functions,
//! events, using-for bindings). Functions and modifiers are wrapped as
//! [`FunctionDef`] with call-graph helpers.
//!
//! The model is read-only after construction. Back-references are explicit
//! parameters (`source_slice(&unit)`) rather than stored pointers, and raw
//! tree access goes through [`SourceUnit::contract_node`]; derived and raw
//! data never share a name.

pub mod contract;
pub mod function;
pub mod parser;
pub mod source_unit;

pub use contract::{Contract, ContractKind, EventDef, FunctionCall, NodeRef};
pub use function::{FunctionDef, FunctionKind};
pub use parser::{node_text, parse, SourceLocation};
pub use source_unit::{ImportDirective, PragmaDirective, SourceUnit};
