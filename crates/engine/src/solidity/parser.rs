//! Parser adapter over tree-sitter.
//!
//! Parsing is tolerant: a tree with embedded `ERROR` nodes still succeeds,
//! and the model builder assumes nothing about the children of malformed
//! nodes. Only a parser that produces no tree at all is a parse failure.

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser, Tree};

use crate::core::EngineError;

pub fn language() -> tree_sitter::Language {
    tree_sitter_solidity::LANGUAGE.into()
}

/// Parse Solidity source text into a raw syntax tree.
pub fn parse(source: &str) -> Result<Tree, EngineError> {
    let mut parser = Parser::new();
    parser
        .set_language(&language())
        .map_err(|e| EngineError::Parse(e.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| EngineError::Parse("parser produced no tree".to_string()))
}

pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// A source span in line/column form. Lines are 1-indexed, columns 0-indexed,
/// matching editor conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl SourceLocation {
    pub fn from_node(node: Node<'_>) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_line: start.row + 1,
            start_col: start.column,
            end_line: end.row + 1,
            end_col: end.column,
        }
    }
}
