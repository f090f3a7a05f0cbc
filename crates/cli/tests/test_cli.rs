use std::fs;

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;

const CONTRACT: &str = r#"
pragma solidity ^0.8.0;

contract Treasury {
    function initialize() public {}
}
"#;

fn solgrep() -> Command {
    Command::cargo_bin("solgrep").unwrap()
}

#[test]
fn test_list_rules() {
    solgrep()
        .arg("--list-rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stats"))
        .stdout(predicate::str::contains("DupeFinder"))
        .stdout(predicate::str::contains("IsInitializable"));
}

#[test]
fn test_no_targets_fails() {
    solgrep()
        .assert()
        .failure()
        .stderr(predicate::str::contains("no targets"));
}

#[test]
fn test_unknown_rule_fails() {
    let dir = tempfile::tempdir().unwrap();
    solgrep()
        .arg(dir.path())
        .args(["--rule", "DoesNotExist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown rule"));
}

#[test]
fn test_invalid_pattern_fails() {
    let dir = tempfile::tempdir().unwrap();
    solgrep()
        .arg(dir.path())
        .args(["--find", "function foo() { }"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not allowed"));
}

#[test]
fn test_find_writes_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("treasury.sol"), CONTRACT)?;
    let output = dir.path().join("findings.json");

    solgrep()
        .arg(dir.path())
        .args(["--find", r#"contract.name == "Treasury""#])
        .arg("--sequential")
        .args(["--output", output.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("match-contract: Treasury"))
        .stdout(predicate::str::contains("1 findings"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
    let key = dir.path().join("treasury.sol").to_string_lossy().into_owned();
    assert_eq!(json[key.as_str()][0]["tag"], "match-contract: Treasury");
    Ok(())
}

#[test]
fn test_stats_rule_reports_summary() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("treasury.sol"), CONTRACT)?;

    solgrep()
        .arg(dir.path())
        .args(["--rule", "Stats"])
        .arg("--sequential")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 source units"));
    Ok(())
}
