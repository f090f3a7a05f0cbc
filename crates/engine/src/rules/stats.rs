//! Corpus statistics: source-unit and per-kind contract counts.

use std::collections::BTreeMap;

use anyhow::Result;
use parking_lot::Mutex;
use serde_json::json;

use crate::rules::Rule;
use crate::runner::Reporter;
use crate::solidity::{ContractKind, SourceUnit};

#[derive(Debug, Default, Clone)]
pub struct KindStats {
    pub total: usize,
    /// Name -> number of declarations with that name across the corpus.
    pub names: BTreeMap<String, usize>,
}

impl KindStats {
    fn record(&mut self, name: &str) {
        self.total += 1;
        *self.names.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Report payload with names ordered by occurrence count, most common
    /// first; ties break alphabetically.
    fn to_json(&self) -> serde_json::Value {
        let mut entries: Vec<(&String, &usize)> = self.names.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let mut names = serde_json::Map::new();
        for (name, count) in entries {
            names.insert(name.clone(), json!(count));
        }
        json!({ "total": self.total, "names": names })
    }
}

#[derive(Debug, Default, Clone)]
pub struct StatsData {
    pub source_units: usize,
    pub contracts: KindStats,
    pub interfaces: KindStats,
    pub libraries: KindStats,
    /// Abstract declarations are counted into `contracts` as well, since an
    /// abstract contract is a contract; this tally tracks them separately.
    pub abstracts: KindStats,
}

pub struct Stats {
    data: Mutex<StatsData>,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(StatsData::default()),
        }
    }

    pub fn snapshot(&self) -> StatsData {
        self.data.lock().clone()
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for Stats {
    fn id(&self) -> &'static str {
        "Stats"
    }

    fn description(&self) -> &'static str {
        "Collects statistics of contract names, kinds and source units"
    }

    fn on_process(&self, unit: &SourceUnit, _reporter: &Reporter<'_>) -> Result<()> {
        let mut data = self.data.lock();
        data.source_units += 1;
        for contract in unit.contracts.values() {
            match contract.kind {
                ContractKind::Contract => data.contracts.record(&contract.name),
                ContractKind::Interface => data.interfaces.record(&contract.name),
                ContractKind::Library => data.libraries.record(&contract.name),
                ContractKind::Abstract => {
                    data.contracts.record(&contract.name);
                    data.abstracts.record(&contract.name);
                }
            }
        }
        Ok(())
    }

    fn on_dir_analyzed(&self, reporter: &Reporter<'_>) {
        let data = self.data.lock();
        let info = json!({
            "sourceUnits": data.source_units,
            "contracts": data.contracts.to_json(),
            "interfaces": data.interfaces.to_json(),
            "libraries": data.libraries.to_json(),
            "abstract": data.abstracts.to_json(),
        });
        reporter.report(None, self.id(), "STATS", info, None);
    }

    fn on_close(&self, _reporter: &Reporter<'_>) {
        let data = self.data.lock();
        println!(
            "📊 stats: {} source units, {} contracts, {} interfaces, {} libraries ({} abstract)",
            data.source_units,
            data.contracts.total,
            data.interfaces.total,
            data.libraries.total,
            data.abstracts.total,
        );
    }
}
