//! Function and modifier model.

use std::collections::HashMap;

use tree_sitter::Node;

use crate::core::EngineError;
use crate::solidity::contract::{self, FunctionCall, NodeRef};
use crate::solidity::parser::{node_text, SourceLocation};
use crate::solidity::source_unit::SourceUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Modifier,
    Constructor,
    Fallback,
    Receive,
}

/// One function or modifier. The three special forms get synthetic names so
/// rules never have to inspect node flags; the source-level identifier is
/// never used for them.
#[derive(Debug)]
pub struct FunctionDef {
    pub kind: FunctionKind,
    pub name: String,
    pub visibility: String,
    pub state_mutability: String,
    pub has_body: bool,
    /// Modifier-invocation name -> invocation node. Empty for constructors.
    pub modifiers: HashMap<String, NodeRef>,
    pub loc: SourceLocation,
    pub byte_range: (usize, usize),
    calls: Vec<FunctionCall>,
}

impl FunctionDef {
    pub fn from_node(
        node: Node<'_>,
        source: &str,
        kind: FunctionKind,
    ) -> Result<Self, EngineError> {
        let name = match kind {
            FunctionKind::Constructor => "__constructor__".to_string(),
            FunctionKind::Fallback => "__fallback__".to_string(),
            FunctionKind::Receive => "__receiveEther__".to_string(),
            FunctionKind::Function | FunctionKind::Modifier => node
                .child_by_field_name("name")
                .map(|n| node_text(n, source).to_string())
                .unwrap_or_default(),
        };

        // base-constructor arguments look like modifier invocations; keep
        // constructors' map empty
        let modifiers = if kind == FunctionKind::Constructor {
            HashMap::new()
        } else {
            modifier_invocations(node, source)
        };

        Ok(Self {
            kind,
            name,
            visibility: extract_visibility(node, source),
            state_mutability: extract_state_mutability(node, source),
            has_body: node.child_by_field_name("body").is_some(),
            modifiers,
            loc: SourceLocation::from_node(node),
            byte_range: (node.start_byte(), node.end_byte()),
            calls: contract::extract_calls(node, source)?,
        })
    }

    /// True iff the body contains a call expression targeting `name` via
    /// member access, bare identifier or type-name invocation. Short-circuits
    /// on the first match; false for an empty body.
    pub fn calls_to(&self, name: &str) -> bool {
        self.calls.iter().any(|c| c.name == name)
    }

    pub fn calls(&self) -> &[FunctionCall] {
        &self.calls
    }

    pub fn source_slice(&self, unit: &SourceUnit) -> String {
        unit.line_slice(self.loc)
    }
}

fn modifier_invocations(node: Node<'_>, source: &str) -> HashMap<String, NodeRef> {
    let mut out = HashMap::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifier_invocation" {
            let mut inner = child.walk();
            for part in child.named_children(&mut inner) {
                if part.kind() == "identifier" {
                    out.insert(node_text(part, source).to_string(), NodeRef::from_node(child));
                    break;
                }
            }
        }
    }
    out
}

fn extract_visibility(node: Node<'_>, source: &str) -> String {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "visibility" => return node_text(child, source).to_string(),
            "public" | "private" | "internal" | "external" => {
                return node_text(child, source).to_string()
            }
            _ => {}
        }
    }
    String::new()
}

fn extract_state_mutability(node: Node<'_>, source: &str) -> String {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "state_mutability" => return node_text(child, source).to_string(),
            "pure" | "view" | "payable" => return node_text(child, source).to_string(),
            _ => {}
        }
    }
    String::new()
}
