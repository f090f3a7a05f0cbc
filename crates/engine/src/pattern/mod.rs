//! The grep-pattern DSL: a single textual expression evaluated against one
//! of four semantic scopes (`sourceUnit`, `contract`, `function`,
//! `modifier`).
//!
//! Patterns are validated and compiled at rule registration; a bad pattern
//! aborts startup before any file is touched. Because `function` collides
//! with the expression grammar's member-call syntax expectations inherited
//! by pattern authors, the literal text `function.` is rewritten to
//! `_function.` before compilation, and the current function is exposed to
//! the expression under the name `_function`.

pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

pub use eval::{eval, EvalError, EvalScope};
pub use parser::Expr;
pub use value::Value;

use crate::core::EngineError;

/// Which scope variables a pattern references, decided by literal substring
/// tests on the raw pattern text. Drives the iteration depth in
/// `GenericGrep`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeSet {
    pub source_unit: bool,
    pub contract: bool,
    pub function: bool,
    pub modifier: bool,
}

impl ScopeSet {
    fn classify(raw: &str) -> Self {
        Self {
            source_unit: raw.contains("sourceUnit"),
            contract: raw.contains("contract."),
            function: raw.contains("function."),
            modifier: raw.contains("modifier."),
        }
    }

    /// A pattern referencing no scope variable is inert and never evaluated.
    pub fn is_inert(&self) -> bool {
        !(self.source_unit || self.contract || self.function || self.modifier)
    }

    /// Only the per-file scope: evaluate once per source unit and stop.
    pub fn source_unit_only(&self) -> bool {
        self.source_unit && !self.contract && !self.function && !self.modifier
    }

    /// No per-function or per-modifier iteration needed.
    pub fn contract_level_only(&self) -> bool {
        !self.function && !self.modifier
    }
}

/// A validated, compiled pattern.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// The pattern as supplied by the caller, used in error messages and
    /// finding tags.
    pub raw: String,
    pub scopes: ScopeSet,
    pub expr: Expr,
}

/// Substrings that indicate a statement or block rather than a single
/// expression. Kept deliberately coarse: a false rejection costs the author
/// a clearer pattern, a false accept could smuggle in statement syntax.
const REJECTED_FRAGMENTS: [&str; 6] = ["{", "}", "function ", "class ", "this.", "async"];

/// Validate and compile pattern strings. Empty patterns (after trimming) are
/// dropped silently; inert patterns are dropped with a debug log; anything
/// invalid is a hard error.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<CompiledPattern>, EngineError> {
    let mut compiled = Vec::new();
    for raw in patterns {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        if let Some(pattern) = compile_one(raw)? {
            compiled.push(pattern);
        }
    }
    Ok(compiled)
}

fn compile_one(raw: &str) -> Result<Option<CompiledPattern>, EngineError> {
    let invalid = |reason: String| EngineError::InvalidPattern {
        pattern: raw.to_string(),
        reason,
    };

    if raw.contains('\n') {
        return Err(invalid("patterns must be a single line".to_string()));
    }
    for fragment in REJECTED_FRAGMENTS {
        if raw.contains(fragment) {
            return Err(invalid(format!(
                "`{}` is not allowed in a pattern",
                fragment.trim_end()
            )));
        }
    }
    if raw.contains("require") {
        return Err(invalid("`require` is not allowed in a pattern".to_string()));
    }

    let scopes = ScopeSet::classify(raw);
    if scopes.is_inert() {
        tracing::debug!(pattern = raw, "pattern references no scope variable, skipping");
        return Ok(None);
    }

    let rewritten = raw.replace("function.", "_function.");
    let expr = parser::parse(&rewritten).map_err(invalid)?;

    Ok(Some(CompiledPattern {
        raw: raw.to_string(),
        scopes,
        expr,
    }))
}
