//! Duplicate-contract detection over a whole scanned corpus.
//!
//! Every contract is hashed under each configured mode and indexed as
//! `mode -> hash -> [file::contractName]`. At directory completion the full
//! inverted index is reported as one aggregate finding; at run close the
//! index is reduced to buckets with more than one member and a per-mode
//! duplicate ratio is printed.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use parking_lot::Mutex;
use serde_json::json;

use crate::hashing::{hash_contract, HashMode, HASH_MODES};
use crate::rules::Rule;
use crate::runner::Reporter;
use crate::solidity::SourceUnit;

type DupeIndex = HashMap<HashMode, BTreeMap<u64, Vec<String>>>;

#[derive(Debug, Clone)]
pub struct ModeSummary {
    pub mode: HashMode,
    pub total: usize,
    pub unique: usize,
    /// Buckets with more than one member, ascending by size. Labels sorted.
    pub clusters: Vec<(u64, Vec<String>)>,
}

impl ModeSummary {
    /// `(total - unique) / total`; zero when the corpus had no contracts.
    pub fn duplicate_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.total - self.unique) as f64 / self.total as f64
    }
}

pub struct DupeFinder {
    modes: Vec<HashMode>,
    index: Mutex<DupeIndex>,
}

impl DupeFinder {
    pub fn new() -> Self {
        Self::with_modes(HASH_MODES.to_vec())
    }

    pub fn with_modes(modes: Vec<HashMode>) -> Self {
        let mut index = DupeIndex::new();
        for mode in &modes {
            index.insert(*mode, BTreeMap::new());
        }
        Self {
            modes,
            index: Mutex::new(index),
        }
    }

    /// Per-mode totals and duplicate clusters for the corpus seen so far.
    pub fn summaries(&self) -> Vec<ModeSummary> {
        let index = self.index.lock();
        self.modes
            .iter()
            .map(|mode| {
                let buckets = &index[mode];
                let total = buckets.values().map(Vec::len).sum();
                let unique = buckets.values().filter(|v| v.len() == 1).count();
                let mut clusters: Vec<(u64, Vec<String>)> = buckets
                    .iter()
                    .filter(|(_, v)| v.len() > 1)
                    .map(|(h, v)| {
                        let mut labels = v.clone();
                        labels.sort();
                        (*h, labels)
                    })
                    .collect();
                clusters.sort_by_key(|(_, v)| v.len());
                ModeSummary {
                    mode: *mode,
                    total,
                    unique,
                    clusters,
                }
            })
            .collect()
    }

    fn index_json(&self) -> serde_json::Value {
        let index = self.index.lock();
        let mut out = serde_json::Map::new();
        for mode in &self.modes {
            let mut buckets = serde_json::Map::new();
            for (hash, labels) in &index[mode] {
                let mut labels = labels.clone();
                labels.sort();
                buckets.insert(format!("{hash:016x}"), json!(labels));
            }
            out.insert(mode.to_string(), serde_json::Value::Object(buckets));
        }
        serde_json::Value::Object(out)
    }
}

impl Default for DupeFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for DupeFinder {
    fn id(&self) -> &'static str {
        "DupeFinder"
    }

    fn description(&self) -> &'static str {
        "Finds duplicate contracts: structural (fuzzy) or exact syntax-tree matches"
    }

    fn on_process(&self, unit: &SourceUnit, _reporter: &Reporter<'_>) -> Result<()> {
        for contract in unit.contracts.values() {
            // malformed declarations may not resolve to a node; skip them
            let Some(node) = unit.contract_node(contract) else {
                continue;
            };
            let label = format!("{}::{}", unit.file_key(), contract.name);
            let mut index = self.index.lock();
            for (mode, buckets) in index.iter_mut() {
                let hash = hash_contract(*mode, node, unit.source());
                buckets.entry(hash).or_default().push(label.clone());
            }
        }
        Ok(())
    }

    fn on_dir_analyzed(&self, reporter: &Reporter<'_>) {
        reporter.report(None, self.id(), "DUPES", self.index_json(), None);
    }

    fn on_close(&self, _reporter: &Reporter<'_>) {
        println!();
        println!("ℹ️  Duplicate contracts per hashing mode:");
        for summary in self.summaries() {
            let dupes = summary.total - summary.unique;
            println!(
                "   → {}: {}/{} ({:.1} % duplicates)",
                summary.mode,
                dupes,
                summary.total,
                100.0 * summary.duplicate_ratio()
            );
            for (hash, labels) in &summary.clusters {
                println!("     {hash:016x} => {}", labels.join(", "));
            }
        }
    }
}
