//! Proxy-style initializer checks.

use anyhow::Result;
use serde_json::json;

use crate::rules::Rule;
use crate::runner::Reporter;
use crate::solidity::{Contract, SourceUnit};

const DANGEROUS_FRAGMENTS: [&str; 3] = ["selfdestruct", "delegatecall", "callcode"];

/// Flags contracts exposing a public `initialize` entry point that is not
/// guarded by `onlyOwner` and not invoked from the constructor. Such
/// contracts are typically proxy implementations that anyone can claim.
pub struct IsInitializable;

impl IsInitializable {
    pub fn new() -> Self {
        Self
    }

    fn constructor_auto_inits(contract: &Contract) -> bool {
        contract
            .constructor_fn()
            .is_some_and(|ctor| ctor.calls_to("initialize"))
    }
}

impl Default for IsInitializable {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for IsInitializable {
    fn id(&self) -> &'static str {
        "IsInitializable"
    }

    fn description(&self) -> &'static str {
        "Checks if a contract is initializable by anyone and not auto-initialized in the constructor"
    }

    fn on_process(&self, unit: &SourceUnit, reporter: &Reporter<'_>) -> Result<()> {
        for contract in unit.contracts.values() {
            let exposed: Vec<_> = contract
                .functions
                .iter()
                .filter(|f| {
                    f.name == "initialize"
                        && f.has_body
                        && (f.visibility == "public" || f.visibility == "external")
                        && !f.modifiers.contains_key("onlyOwner")
                })
                .collect();

            if exposed.is_empty() || Self::constructor_auto_inits(contract) {
                continue;
            }

            for function in &exposed {
                reporter.report(
                    Some(unit),
                    self.id(),
                    "INITIALIZEABLE",
                    json!(format!(
                        "{} - public initialize function; likely proxy",
                        function.name
                    )),
                    Some(function.loc),
                );
            }

            let source = contract.source_slice(unit);
            if DANGEROUS_FRAGMENTS.iter().any(|frag| source.contains(frag)) {
                reporter.report(
                    Some(unit),
                    self.id(),
                    "INITIALIZEABLE_DANGEROUS",
                    json!(format!(
                        "{} - public initialize function + dangerous functionality; likely proxy",
                        contract.name
                    )),
                    Some(unit.loc()),
                );
            }
        }
        Ok(())
    }
}

/// Double-accounting heuristic: a function that reads `.balanceOf` twice and
/// diffs the results is a candidate for balance-manipulation bugs.
///
/// The heuristic fires far too often on legitimate reward accounting, so
/// reporting stays off until the detection is narrowed down to transfers
/// between the two reads. The matching is kept live so the cost of the
/// check shows up in profiles.
pub struct IsMultipleBalanceOfSameFunc;

const REPORT_DBL_BALANCEOF: bool = false;

impl IsMultipleBalanceOfSameFunc {
    pub fn new() -> Self {
        Self
    }

    fn matches(body: &str) -> bool {
        body.matches(".balanceOf").count() >= 2 && body.matches("diff").count() >= 2
    }
}

impl Default for IsMultipleBalanceOfSameFunc {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for IsMultipleBalanceOfSameFunc {
    fn id(&self) -> &'static str {
        "IsMultipleBalanceOfSameFunc"
    }

    fn description(&self) -> &'static str {
        "Checks if a contract has multiple balanceOf() calls within the same function"
    }

    fn on_process(&self, unit: &SourceUnit, reporter: &Reporter<'_>) -> Result<()> {
        for contract in unit.contracts.values() {
            for function in &contract.functions {
                if function.modifiers.contains_key("nonReentrant") {
                    continue;
                }
                if Self::matches(&function.source_slice(unit)) && REPORT_DBL_BALANCEOF {
                    reporter.report(
                        Some(unit),
                        self.id(),
                        "DBL_BALANCEOF",
                        json!(format!(
                            "{} - balanceOf() called multiple times within same func",
                            function.name
                        )),
                        Some(function.loc),
                    );
                }
            }
        }
        Ok(())
    }
}
