//! Contract model and the classification pass over a contract body.

use std::collections::HashMap;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};

use crate::core::EngineError;
use crate::solidity::function::{FunctionDef, FunctionKind};
use crate::solidity::parser::{self, node_text, SourceLocation};
use crate::solidity::source_unit::SourceUnit;

/// Declared kind of a top-level type. The set is closed: a declaration node
/// outside it is a grammar-version mismatch, fatal to that file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Contract,
    Interface,
    Library,
    Abstract,
}

impl ContractKind {
    fn classify(decl: Node<'_>) -> Result<Self, EngineError> {
        match decl.kind() {
            "interface_declaration" => Ok(Self::Interface),
            "library_declaration" => Ok(Self::Library),
            "contract_declaration" => {
                if has_token(decl, "abstract") {
                    Ok(Self::Abstract)
                } else {
                    Ok(Self::Contract)
                }
            }
            other => Err(EngineError::ModelIntegrity(format!(
                "unrecognized contract kind `{other}`"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contract => "contract",
            Self::Interface => "interface",
            Self::Library => "library",
            Self::Abstract => "abstract",
        }
    }
}

/// Non-owning reference to a raw tree node: its byte span plus line range.
/// The model never stores `tree_sitter::Node` directly; nodes are recovered
/// through [`SourceUnit::contract_node`] when raw access is needed.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef {
    pub byte_range: (usize, usize),
    pub loc: SourceLocation,
}

impl NodeRef {
    pub fn from_node(node: Node<'_>) -> Self {
        Self {
            byte_range: (node.start_byte(), node.end_byte()),
            loc: SourceLocation::from_node(node),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventDef {
    pub name: String,
    pub loc: SourceLocation,
    /// Parameter name -> declaration, pre-indexed for argument lookup.
    pub arguments: HashMap<String, NodeRef>,
}

/// One call expression found in a contract body, with its resolved target
/// name.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    pub name: String,
    pub loc: SourceLocation,
}

/// One contract / interface / library / abstract declaration.
#[derive(Debug)]
pub struct Contract {
    pub kind: ContractKind,
    pub name: String,
    /// Base contract names. Dependency edges only; not resolved further.
    pub dependencies: Vec<String>,
    pub byte_range: (usize, usize),
    pub loc: SourceLocation,
    pub state_vars: HashMap<String, NodeRef>,
    pub enums: HashMap<String, NodeRef>,
    pub structs: HashMap<String, NodeRef>,
    /// State variables of mapping type, keyed by variable name.
    pub mappings: HashMap<String, NodeRef>,
    /// `using X for Y` bindings keyed by library name.
    pub using_for: HashMap<String, NodeRef>,
    pub modifiers: HashMap<String, FunctionDef>,
    /// Functions in declaration order; overloads keep separate entries. The
    /// three special forms live here too, referenced by index below.
    pub functions: Vec<FunctionDef>,
    pub constructor: Option<usize>,
    pub fallback: Option<usize>,
    pub receive_ether: Option<usize>,
    pub events: Vec<EventDef>,
    /// Every call expression anywhere in the body, for intra-contract call
    /// queries.
    pub function_calls: Vec<FunctionCall>,
}

impl Contract {
    pub fn from_node(decl: Node<'_>, source: &str) -> Result<Self, EngineError> {
        let kind = ContractKind::classify(decl)?;
        let name = decl
            .child_by_field_name("name")
            .map(|n| node_text(n, source).to_string())
            .unwrap_or_default();

        let mut contract = Self {
            kind,
            name,
            dependencies: Vec::new(),
            byte_range: (decl.start_byte(), decl.end_byte()),
            loc: SourceLocation::from_node(decl),
            state_vars: HashMap::new(),
            enums: HashMap::new(),
            structs: HashMap::new(),
            mappings: HashMap::new(),
            using_for: HashMap::new(),
            modifiers: HashMap::new(),
            functions: Vec::new(),
            constructor: None,
            fallback: None,
            receive_ether: None,
            events: Vec::new(),
            function_calls: Vec::new(),
        };

        let mut cursor = decl.walk();
        for child in decl.named_children(&mut cursor) {
            match child.kind() {
                "inheritance_specifier" => {
                    if let Some(base) = child.named_child(0) {
                        contract
                            .dependencies
                            .push(node_text(base, source).to_string());
                    }
                }
                "contract_body" => contract.classify_body(child, source)?,
                _ => {}
            }
        }

        contract.function_calls = extract_calls(decl, source)?;
        Ok(contract)
    }

    /// Classify each child of the body by syntactic kind into the model's
    /// buckets. Malformed nodes without a name are skipped, not errors; the
    /// parser is tolerant and so is the builder.
    fn classify_body(&mut self, body: Node<'_>, source: &str) -> Result<(), EngineError> {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            match child.kind() {
                "state_variable_declaration" => {
                    let Some(name) = named_field(child, source) else {
                        continue;
                    };
                    self.state_vars.insert(name.clone(), NodeRef::from_node(child));
                    let is_mapping = child
                        .child_by_field_name("type")
                        .is_some_and(|t| node_text(t, source).trim_start().starts_with("mapping"));
                    if is_mapping {
                        self.mappings.insert(name, NodeRef::from_node(child));
                    }
                }
                "enum_declaration" => {
                    if let Some(name) = named_field(child, source) {
                        self.enums.insert(name, NodeRef::from_node(child));
                    }
                }
                "struct_declaration" => {
                    if let Some(name) = named_field(child, source) {
                        self.structs.insert(name, NodeRef::from_node(child));
                    }
                }
                "using_directive" => {
                    if let Some(lib) = child.named_child(0) {
                        self.using_for
                            .insert(node_text(lib, source).to_string(), NodeRef::from_node(child));
                    }
                }
                "event_definition" => self.events.push(event_from_node(child, source)),
                "modifier_definition" => {
                    let def = FunctionDef::from_node(child, source, FunctionKind::Modifier)?;
                    self.modifiers.insert(def.name.clone(), def);
                }
                "function_definition" => {
                    let def = FunctionDef::from_node(child, source, FunctionKind::Function)?;
                    self.functions.push(def);
                }
                "constructor_definition" => {
                    let def = FunctionDef::from_node(child, source, FunctionKind::Constructor)?;
                    self.functions.push(def);
                    // last write wins if the grammar lets several through
                    self.constructor = Some(self.functions.len() - 1);
                }
                "fallback_receive_definition" => {
                    let kind = if has_token(child, "receive") {
                        FunctionKind::Receive
                    } else {
                        FunctionKind::Fallback
                    };
                    let def = FunctionDef::from_node(child, source, kind)?;
                    self.functions.push(def);
                    let idx = Some(self.functions.len() - 1);
                    match kind {
                        FunctionKind::Receive => self.receive_ether = idx,
                        _ => self.fallback = idx,
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// The contract's source text, derived on demand from the owning unit's
    /// content and this node's line range.
    pub fn source_slice(&self, unit: &SourceUnit) -> String {
        unit.line_slice(self.loc)
    }

    pub fn constructor_fn(&self) -> Option<&FunctionDef> {
        self.constructor.map(|i| &self.functions[i])
    }

    pub fn fallback_fn(&self) -> Option<&FunctionDef> {
        self.fallback.map(|i| &self.functions[i])
    }

    pub fn receive_fn(&self) -> Option<&FunctionDef> {
        self.receive_ether.map(|i| &self.functions[i])
    }
}

fn named_field(node: Node<'_>, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .map(|n| node_text(n, source).to_string())
}

/// True if any direct child token of `node` has the given kind.
fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == token);
    found
}

fn event_from_node(node: Node<'_>, source: &str) -> EventDef {
    let name = named_field(node, source).unwrap_or_default();
    let mut arguments = HashMap::new();
    collect_event_params(node, source, &mut arguments);
    EventDef {
        name,
        loc: SourceLocation::from_node(node),
        arguments,
    }
}

fn collect_event_params(node: Node<'_>, source: &str, out: &mut HashMap<String, NodeRef>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        // the grammar's event parameter kind has varied across versions, so
        // match loosely on the kind name
        if child.kind().contains("param") {
            let name = named_field(child, source).or_else(|| {
                let mut c = child.walk();
                child
                    .named_children(&mut c)
                    .filter(|n| n.kind() == "identifier")
                    .last()
                    .map(|n| node_text(n, source).to_string())
            });
            if let Some(name) = name {
                out.insert(name, NodeRef::from_node(child));
            }
        } else {
            collect_event_params(child, source, out);
        }
    }
}

const CALL_QUERY: &str = "(call_expression) @call";

/// Collect every call expression under `node` with a resolvable target name.
pub(crate) fn extract_calls(
    node: Node<'_>,
    source: &str,
) -> Result<Vec<FunctionCall>, EngineError> {
    let language = parser::language();
    let query = Query::new(&language, CALL_QUERY)
        .map_err(|e| EngineError::ModelIntegrity(format!("call query: {e}")))?;
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, node, source.as_bytes());

    let mut calls = Vec::new();
    matches.advance();
    while let Some(m) = matches.get() {
        for capture in m.captures {
            if let Some(name) = call_target(capture.node, source) {
                calls.push(FunctionCall {
                    name,
                    loc: SourceLocation::from_node(capture.node),
                });
            }
        }
        matches.advance();
    }
    Ok(calls)
}

/// Resolve the target name of a call expression: member access takes the
/// member name, a bare identifier its own name, a type-name invocation the
/// type's name. Anything else has no queryable target.
fn call_target(call: Node<'_>, source: &str) -> Option<String> {
    let mut callee = call
        .child_by_field_name("function")
        .or_else(|| call.named_child(0))?;
    while matches!(callee.kind(), "expression" | "parenthesized_expression")
        && callee.named_child_count() == 1
    {
        callee = callee.named_child(0)?;
    }
    match callee.kind() {
        "member_expression" => callee
            .child_by_field_name("property")
            .or_else(|| {
                let mut c = callee.walk();
                callee
                    .named_children(&mut c)
                    .filter(|n| n.kind() == "identifier")
                    .last()
            })
            .map(|n| node_text(n, source).to_string()),
        "identifier" => Some(node_text(callee, source).to_string()),
        "primitive_type" | "user_defined_type" | "type_name" => {
            Some(node_text(callee, source).to_string())
        }
        _ => None,
    }
}
