//! One parsed input file and everything declared at its top level.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tree_sitter::{Node, Tree};

use crate::core::EngineError;
use crate::solidity::contract::Contract;
use crate::solidity::parser::{self, node_text, SourceLocation};

#[derive(Debug, Clone)]
pub struct PragmaDirective {
    pub text: String,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct ImportDirective {
    /// The imported path with surrounding quotes stripped.
    pub path: String,
    pub loc: SourceLocation,
}

/// One parsed file. Constructed once by parsing; immutable afterwards and
/// owned by the engine for the duration of a run.
pub struct SourceUnit {
    pub file_path: PathBuf,
    pub content: String,
    tree: Tree,
    pub pragmas: Vec<PragmaDirective>,
    pub imports: Vec<ImportDirective>,
    /// Contract name -> model. Names are unique within a file; a later
    /// contract with the same name overwrites an earlier one. Lenient by
    /// design.
    pub contracts: HashMap<String, Contract>,
}

impl SourceUnit {
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(path, content)
    }

    /// Build a source unit from in-memory text. `path` is used only as the
    /// finding key and in duplicate labels.
    pub fn from_source(path: &Path, content: String) -> Result<Self, EngineError> {
        let tree = parser::parse(&content)?;
        let mut unit = Self {
            file_path: path.to_path_buf(),
            content,
            tree,
            pragmas: Vec::new(),
            imports: Vec::new(),
            contracts: HashMap::new(),
        };
        unit.build_model()?;
        Ok(unit)
    }

    /// Single traversal over the file-level tree collecting pragmas, imports
    /// and contract declarations. Contract bodies are classified by
    /// [`Contract::from_node`].
    fn build_model(&mut self) -> Result<(), EngineError> {
        let root = self.tree.root_node();
        let mut cursor = root.walk();
        let mut contracts = Vec::new();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "pragma_directive" => self.pragmas.push(PragmaDirective {
                    text: node_text(child, &self.content).to_string(),
                    loc: SourceLocation::from_node(child),
                }),
                "import_directive" => self.imports.push(import_from_node(child, &self.content)),
                "contract_declaration" | "interface_declaration" | "library_declaration" => {
                    contracts.push(Contract::from_node(child, &self.content)?);
                }
                // file-level data declarations carry no contract body
                "struct_declaration" | "enum_declaration" | "error_declaration"
                | "constant_variable_declaration" => {}
                kind if kind.ends_with("_declaration") => {
                    // declaration-shaped but outside the contract family:
                    // let the classifier reject it, fatal to this file
                    contracts.push(Contract::from_node(child, &self.content)?);
                }
                _ => {}
            }
        }
        for contract in contracts {
            self.contracts.insert(contract.name.clone(), contract);
        }
        Ok(())
    }

    pub fn source(&self) -> &str {
        &self.content
    }

    /// Key under which this unit's findings are stored.
    pub fn file_key(&self) -> String {
        self.file_path.to_string_lossy().into_owned()
    }

    /// Span of the whole file.
    pub fn loc(&self) -> SourceLocation {
        SourceLocation::from_node(self.tree.root_node())
    }

    /// Resolve a contract back to its raw declaration node, e.g. for
    /// structural hashing. Explicit accessor by design: derived model fields
    /// never shadow raw tree access.
    pub fn contract_node(&self, contract: &Contract) -> Option<Node<'_>> {
        let (start, end) = contract.byte_range;
        let node = self
            .tree
            .root_node()
            .named_descendant_for_byte_range(start, end)?;
        (node.start_byte() == start && node.end_byte() == end).then_some(node)
    }

    /// Lines `start_line..=end_line` of the file, used by the model's
    /// `source_slice` helpers.
    pub fn line_slice(&self, loc: SourceLocation) -> String {
        self.content
            .lines()
            .skip(loc.start_line.saturating_sub(1))
            .take(loc.end_line.saturating_sub(loc.start_line) + 1)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn import_from_node(node: Node<'_>, source: &str) -> ImportDirective {
    let path = node
        .child_by_field_name("source")
        .or_else(|| {
            let mut cursor = node.walk();
            let found = node
                .named_children(&mut cursor)
                .find(|c| c.kind() == "string");
            found
        })
        .map(|n| node_text(n, source).trim_matches(['"', '\'']).to_string())
        .unwrap_or_default();
    ImportDirective {
        path,
        loc: SourceLocation::from_node(node),
    }
}
