use std::fs;
use std::path::Path;

use anyhow::Result;
use solgrep_engine::{DupeFinder, EngineConfig, HashMode, Rule, SolGrep, GENERAL_KEY};
use tempfile::TempDir;

// structurally identical to WALLET_B, every identifier renamed
const WALLET_A: &str = r#"
contract WalletA {
    mapping(address => uint256) balances;

    function deposit() public payable {
        balances[msg.sender] += msg.value;
    }
}
"#;

const WALLET_B: &str = r#"
contract WalletB {
    mapping(address => uint256) holdings;

    function stash() public payable {
        holdings[msg.sender] += msg.value;
    }
}
"#;

const UNRELATED: &str = r#"
contract Registry {
    address public owner;

    function claim() external {
        owner = msg.sender;
    }
}
"#;

fn corpus() -> Result<TempDir> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("a.sol"), WALLET_A)?;
    fs::write(dir.path().join("b.sol"), WALLET_B)?;
    fs::write(dir.path().join("c.sol"), UNRELATED)?;
    Ok(dir)
}

fn run_dupe_finder(dir: &Path) -> Result<SolGrep> {
    let rules: Vec<Box<dyn Rule>> = vec![Box::new(DupeFinder::new())];
    let engine = SolGrep::new(rules).with_config(EngineConfig { parallel: false });
    engine.analyze(dir)?;
    Ok(engine)
}

fn dupes_payload(engine: &SolGrep) -> serde_json::Value {
    let findings = engine.findings().remove(GENERAL_KEY).unwrap_or_default();
    let dupes = findings
        .iter()
        .find(|f| f.tag == "DUPES")
        .expect("aggregate DUPES finding");
    dupes.info.clone()
}

#[test]
fn test_structural_mode_collides_on_renamed_identifiers() -> Result<()> {
    let dir = corpus()?;
    let engine = run_dupe_finder(dir.path())?;
    let payload = dupes_payload(&engine);

    let structural = payload["AST_STRUCTURE"].as_object().unwrap();
    let cluster = structural
        .values()
        .find(|labels| labels.as_array().unwrap().len() > 1)
        .expect("one structural duplicate cluster");
    let labels: Vec<&str> = cluster
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l.as_str().unwrap())
        .collect();
    assert_eq!(labels.len(), 2);
    assert!(labels[0].ends_with("a.sol::WalletA"));
    assert!(labels[1].ends_with("b.sol::WalletB"));

    // exact mode keeps identifier text, so the rename separates them
    let exact = payload["AST_EXACT"].as_object().unwrap();
    assert!(exact.values().all(|labels| labels.as_array().unwrap().len() == 1));
    Ok(())
}

#[test]
fn test_index_is_deterministic_across_runs() -> Result<()> {
    let dir = corpus()?;
    let first = dupes_payload(&run_dupe_finder(dir.path())?);
    let second = dupes_payload(&run_dupe_finder(dir.path())?);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_summaries_count_duplicates() -> Result<()> {
    let dir = corpus()?;
    let rule = DupeFinder::new();
    {
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(DupeFinder::new())];
        let engine = SolGrep::new(rules).with_config(EngineConfig { parallel: false });
        engine.analyze(dir.path())?;
        let payload = dupes_payload(&engine);
        // three contracts total under each mode
        let total: usize = payload["AST_EXACT"]
            .as_object()
            .unwrap()
            .values()
            .map(|labels| labels.as_array().unwrap().len())
            .sum();
        assert_eq!(total, 3);
    }

    // a fresh instance has seen nothing; the ratio must not divide by zero
    for summary in rule.summaries() {
        assert_eq!(summary.total, 0);
        assert_eq!(summary.duplicate_ratio(), 0.0);
        assert!(summary.clusters.is_empty());
    }
    Ok(())
}

#[test]
fn test_single_mode_configuration() -> Result<()> {
    let dir = corpus()?;
    let rules: Vec<Box<dyn Rule>> =
        vec![Box::new(DupeFinder::with_modes(vec![HashMode::AstExact]))];
    let engine = SolGrep::new(rules).with_config(EngineConfig { parallel: false });
    engine.analyze(dir.path())?;

    let payload = dupes_payload(&engine);
    assert!(payload.get("AST_EXACT").is_some());
    assert!(payload.get("AST_STRUCTURE").is_none());
    Ok(())
}
