//! Structural hashing of contract subtrees.
//!
//! Two modes are supported:
//!
//! - [`HashMode::AstExact`] keeps identifier and literal text, so two
//!   contracts hash equal only when they match token for token (modulo
//!   whitespace and comments).
//! - [`HashMode::AstStructure`] replaces identifiers and literals with type
//!   markers, so contracts with the same shape but renamed identifiers or
//!   changed constants collide.
//!
//! The hash is xxh3 over a canonical serialization of the subtree:
//! `kind( child child ... )` for inner nodes, token kinds for punctuation and
//! keywords, comments skipped. Deterministic for structurally identical
//! input under a given mode.

use serde::Serialize;
use tree_sitter::Node;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HashMode {
    #[serde(rename = "AST_EXACT")]
    AstExact,
    #[serde(rename = "AST_STRUCTURE")]
    AstStructure,
}

pub const HASH_MODES: [HashMode; 2] = [HashMode::AstExact, HashMode::AstStructure];

impl HashMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AstExact => "AST_EXACT",
            Self::AstStructure => "AST_STRUCTURE",
        }
    }
}

impl std::fmt::Display for HashMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hash one contract's syntax subtree under the given mode.
pub fn hash_contract(mode: HashMode, node: Node<'_>, source: &str) -> u64 {
    let mut buf = String::new();
    serialize_node(node, source, mode, &mut buf, 0);
    xxh3_64(buf.as_bytes())
}

fn is_literal_kind(kind: &str) -> bool {
    matches!(
        kind,
        "number_literal"
            | "string_literal"
            | "string"
            | "hex_string_literal"
            | "unicode_string_literal"
            | "boolean_literal"
            | "true"
            | "false"
    )
}

fn serialize_node(node: Node<'_>, source: &str, mode: HashMode, out: &mut String, depth: usize) {
    // guard against pathologically nested expressions
    if depth > 256 {
        out.push_str("$DEEP ");
        return;
    }

    let kind = node.kind();
    if kind == "comment" {
        return;
    }

    if node.child_count() == 0 || is_literal_kind(kind) {
        match kind {
            "identifier" => match mode {
                HashMode::AstExact => out.push_str(&source[node.byte_range()]),
                HashMode::AstStructure => out.push_str("$ID"),
            },
            k if is_literal_kind(k) => match mode {
                HashMode::AstExact => out.push_str(&source[node.byte_range()]),
                HashMode::AstStructure => out.push_str("$LIT"),
            },
            // punctuation and keyword tokens serialize as their kind, which
            // for anonymous tokens is the token text itself
            _ => out.push_str(kind),
        }
        out.push(' ');
        return;
    }

    out.push_str(kind);
    out.push('(');
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        serialize_node(child, source, mode, out, depth + 1);
    }
    out.push_str(") ");
}
