//! Ad-hoc matching and extraction from pattern strings, without writing a
//! dedicated rule.

use anyhow::{anyhow, Result};

use crate::core::EngineError;
use crate::pattern::{compile_patterns, eval, CompiledPattern, EvalScope, Value};
use crate::rules::Rule;
use crate::runner::Reporter;
use crate::solidity::{Contract, SourceUnit};

pub struct GenericGrep {
    patterns: Vec<CompiledPattern>,
}

impl GenericGrep {
    /// Validate and compile the supplied patterns. Any invalid pattern is a
    /// hard error: the rule set is fixed for the run, so this must stop the
    /// host before any file is processed.
    pub fn new(patterns: &[String]) -> Result<Self, EngineError> {
        Ok(Self {
            patterns: compile_patterns(patterns)?,
        })
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    fn check_contract(
        &self,
        pattern: &CompiledPattern,
        unit: &SourceUnit,
        contract: &Contract,
        reporter: &Reporter<'_>,
    ) -> Result<()> {
        if pattern.scopes.contract_level_only() {
            // contract-scope pattern: one evaluation, then stop descending
            let scope = EvalScope {
                source_unit: unit,
                contract: Some(contract),
                function: None,
                modifier: None,
            };
            let ret = self.eval_pattern(pattern, &scope)?;
            if ret.truthy() {
                reporter.report(
                    Some(unit),
                    self.id(),
                    &format!("match-contract: {}", contract.name),
                    ret.to_info_string().into(),
                    Some(contract.loc),
                );
            }
            return Ok(());
        }

        if pattern.scopes.function {
            for function in &contract.functions {
                let scope = EvalScope {
                    source_unit: unit,
                    contract: Some(contract),
                    function: Some(function),
                    modifier: None,
                };
                let ret = self.eval_pattern(pattern, &scope)?;
                if ret.truthy() {
                    reporter.report(
                        Some(unit),
                        self.id(),
                        &format!("match-function: {}.{}", contract.name, function.name),
                        ret.to_info_string().into(),
                        Some(function.loc),
                    );
                }
            }
        }

        if pattern.scopes.modifier {
            let mut names: Vec<&String> = contract.modifiers.keys().collect();
            names.sort();
            for name in names {
                let modifier = &contract.modifiers[name];
                let scope = EvalScope {
                    source_unit: unit,
                    contract: Some(contract),
                    function: None,
                    modifier: Some(modifier),
                };
                let ret = self.eval_pattern(pattern, &scope)?;
                if ret.truthy() {
                    reporter.report(
                        Some(unit),
                        self.id(),
                        &format!("match-modifier: {}.{}", contract.name, modifier.name),
                        ret.to_info_string().into(),
                        Some(modifier.loc),
                    );
                }
            }
        }

        Ok(())
    }

    fn eval_pattern(&self, pattern: &CompiledPattern, scope: &EvalScope<'_>) -> Result<Value> {
        eval(&pattern.expr, scope)
            .map_err(|e| anyhow!("pattern `{}` failed to evaluate: {e}", pattern.raw))
    }
}

impl Rule for GenericGrep {
    fn id(&self) -> &'static str {
        "GenericGrep"
    }

    fn description(&self) -> &'static str {
        "Matches custom patterns against source units, contracts, functions and modifiers"
    }

    fn on_process(&self, unit: &SourceUnit, reporter: &Reporter<'_>) -> Result<()> {
        // deterministic contract order regardless of map iteration
        let mut contracts: Vec<&Contract> = unit.contracts.values().collect();
        contracts.sort_by(|a, b| a.name.cmp(&b.name));

        for pattern in &self.patterns {
            if pattern.scopes.source_unit_only() {
                let scope = EvalScope {
                    source_unit: unit,
                    contract: None,
                    function: None,
                    modifier: None,
                };
                let ret = self.eval_pattern(pattern, &scope)?;
                if ret.truthy() {
                    reporter.report(
                        Some(unit),
                        self.id(),
                        "match-sourceUnit",
                        ret.to_info_string().into(),
                        Some(unit.loc()),
                    );
                }
                continue;
            }

            for contract in &contracts {
                self.check_contract(pattern, unit, contract, reporter)?;
            }
        }
        Ok(())
    }
}
