//! Findings and the append-only finding sink.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use crate::solidity::SourceLocation;

/// Sink key for findings that are not tied to a single file (aggregate
/// statistics, duplicate clusters).
pub const GENERAL_KEY: &str = "__general__";

/// One structured observation emitted by a rule. Never mutated after
/// creation.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    /// Identity of the reporting rule.
    pub rule: String,
    /// Short tag, e.g. `STATS` or `match-contract: Vault`.
    pub tag: String,
    /// Free-form payload; a string for simple matches, structured JSON for
    /// aggregates.
    pub info: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<SourceLocation>,
}

/// Append-only store mapping file path (or [`GENERAL_KEY`]) to the findings
/// reported for it. Safe to push into concurrently from workers processing
/// different files; per-key ordering follows report order.
#[derive(Default)]
pub struct FindingSink {
    map: Mutex<HashMap<String, Vec<Finding>>>,
    total: AtomicUsize,
}

impl FindingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, key: String, finding: Finding) {
        self.map.lock().entry(key).or_default().push(finding);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Total number of findings across all keys.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Clone of the current findings map.
    pub fn snapshot(&self) -> HashMap<String, Vec<Finding>> {
        self.map.lock().clone()
    }

    /// Serialize the findings map; the JSON schema is exactly the in-memory
    /// schema (`file key -> [{rule, tag, info, loc}]`).
    pub fn to_json(&self) -> serde_json::Result<String> {
        let map = self.map.lock();
        let ordered: std::collections::BTreeMap<_, _> = map.iter().collect();
        serde_json::to_string_pretty(&ordered)
    }
}
