use std::fs;
use std::path::Path;

use anyhow::Result;
use solgrep_engine::{EngineConfig, Finding, GenericGrep, Rule, SolGrep};
use tempfile::TempDir;

const FOO: &str = r#"
pragma solidity ^0.8.0;

contract Foo {
    function hello() public {}
    function pay() external payable {}
    modifier onlyOwner() { _; }
}
"#;

const BAR: &str = r#"
contract Bar {
    function world() external view returns (uint256) { return 1; }
}
"#;

fn corpus() -> Result<TempDir> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("a.sol"), FOO)?;
    fs::write(dir.path().join("b.sol"), BAR)?;
    Ok(dir)
}

fn run(dir: &Path, patterns: &[&str]) -> Result<SolGrep> {
    let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
    let rules: Vec<Box<dyn Rule>> = vec![Box::new(GenericGrep::new(&patterns)?)];
    let engine = SolGrep::new(rules).with_config(EngineConfig { parallel: false });
    engine.analyze(dir)?;
    Ok(engine)
}

fn findings_for(engine: &SolGrep, dir: &Path, file: &str) -> Vec<Finding> {
    let key = dir.join(file).to_string_lossy().into_owned();
    engine.findings().remove(&key).unwrap_or_default()
}

#[test]
fn test_contract_name_match_is_scoped() -> Result<()> {
    let dir = corpus()?;
    let engine = run(dir.path(), &[r#"contract.name == "Foo""#])?;

    let a = findings_for(&engine, dir.path(), "a.sol");
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].tag, "match-contract: Foo");

    let b = findings_for(&engine, dir.path(), "b.sol");
    assert!(b.is_empty());
    Ok(())
}

#[test]
fn test_function_scope_iterates_functions() -> Result<()> {
    let dir = corpus()?;
    let engine = run(dir.path(), &[r#"_function.stateMutability == "view""#])?;

    let b = findings_for(&engine, dir.path(), "b.sol");
    assert_eq!(b.len(), 1);
    assert_eq!(b[0].tag, "match-function: Bar.world");
    assert!(b[0].loc.is_some());
    Ok(())
}

#[test]
fn test_function_alias_is_rewritten() -> Result<()> {
    let dir = corpus()?;
    let engine = run(dir.path(), &[r#"function.visibility == "payable" || function.stateMutability == "payable""#])?;

    let a = findings_for(&engine, dir.path(), "a.sol");
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].tag, "match-function: Foo.pay");
    Ok(())
}

#[test]
fn test_modifier_scope() -> Result<()> {
    let dir = corpus()?;
    let engine = run(dir.path(), &[r#"modifier.name == "onlyOwner""#])?;

    let a = findings_for(&engine, dir.path(), "a.sol");
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].tag, "match-modifier: Foo.onlyOwner");
    Ok(())
}

#[test]
fn test_source_unit_scope_matches_once_per_file() -> Result<()> {
    let dir = corpus()?;
    let engine = run(dir.path(), &[r#"sourceUnit.getSource().includes("world")"#])?;

    let a = findings_for(&engine, dir.path(), "a.sol");
    assert!(a.is_empty());
    let b = findings_for(&engine, dir.path(), "b.sol");
    assert_eq!(b.len(), 1);
    assert_eq!(b[0].tag, "match-sourceUnit");
    Ok(())
}

#[test]
fn test_truthy_result_is_extracted_as_info() -> Result<()> {
    let dir = corpus()?;
    let engine = run(
        dir.path(),
        &[r#"_function.name == "hello" && _function.visibility"#],
    )?;

    let a = findings_for(&engine, dir.path(), "a.sol");
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].info, serde_json::json!("public"));
    Ok(())
}

#[test]
fn test_rejected_patterns() {
    for pattern in [
        "function foo() { }",
        "contract.name == \"a\"\ncontract.name == \"b\"",
        "this.process.exit(1)",
        "require('fs')",
        "class Evil",
        "async () => 1",
    ] {
        let patterns = vec![pattern.to_string()];
        assert!(
            GenericGrep::new(&patterns).is_err(),
            "pattern should be rejected: {pattern}"
        );
    }
}

#[test]
fn test_inert_and_empty_patterns_are_dropped() -> Result<()> {
    let patterns = vec![
        String::new(),
        "   ".to_string(),
        r#""just a string""#.to_string(),
    ];
    let rule = GenericGrep::new(&patterns)?;
    assert_eq!(rule.pattern_count(), 0);
    Ok(())
}

#[test]
fn test_unknown_accessor_is_a_rule_error() -> Result<()> {
    let dir = corpus()?;
    let patterns = vec![r#"contract.selfdestruct("now")"#.to_string()];
    let rules: Vec<Box<dyn Rule>> = vec![Box::new(GenericGrep::new(&patterns)?)];
    let engine = SolGrep::new(rules).with_config(EngineConfig { parallel: false });
    engine.analyze(dir.path())?;

    // both files fail evaluation; neither run aborts
    assert_eq!(engine.error_count(), 2);
    assert_eq!(engine.total_findings(), 0);
    Ok(())
}
