use std::path::Path;

use anyhow::Result;
use solgrep_engine::solidity::{parse, Contract, ContractKind, SourceUnit};
use solgrep_engine::EngineError;

const FIXTURE: &str = r#"
// SPDX-License-Identifier: MIT
pragma solidity ^0.8.20;

import "./SafeMath.sol";

contract Vault is Ownable {
    uint256 public total;
    mapping(address => uint256) public balances;

    event Deposited(address indexed who, uint256 amount);

    modifier onlyOwner() {
        _;
    }

    constructor() {
        initialize();
    }

    function initialize() public {
        total = 0;
    }

    function deposit() external payable {
        balances[msg.sender] += msg.value;
        emit Deposited(msg.sender, msg.value);
    }

    function sweep(address token) internal {
        IERC20(token).transfer(msg.sender, total);
    }

    fallback() external {}

    receive() external payable {}
}

interface IERC20 {
    function transfer(address to, uint256 amount) external returns (bool);
}

library SafeCast {
    function toUint128(uint256 x) internal pure returns (uint128) {
        return uint128(x);
    }
}

abstract contract Base {
    function hook() internal virtual;
}
"#;

fn parse_fixture() -> Result<SourceUnit> {
    Ok(SourceUnit::from_source(
        Path::new("fixture.sol"),
        FIXTURE.to_string(),
    )?)
}

#[test]
fn test_top_level_model() -> Result<()> {
    let unit = parse_fixture()?;

    assert_eq!(unit.pragmas.len(), 1);
    assert!(unit.pragmas[0].text.contains("^0.8.20"));
    assert_eq!(unit.imports.len(), 1);
    assert_eq!(unit.imports[0].path, "./SafeMath.sol");

    assert_eq!(unit.contracts.len(), 4);
    assert_eq!(unit.contracts["Vault"].kind, ContractKind::Contract);
    assert_eq!(unit.contracts["IERC20"].kind, ContractKind::Interface);
    assert_eq!(unit.contracts["SafeCast"].kind, ContractKind::Library);
    assert_eq!(unit.contracts["Base"].kind, ContractKind::Abstract);
    Ok(())
}

#[test]
fn test_contract_buckets() -> Result<()> {
    let unit = parse_fixture()?;
    let vault = &unit.contracts["Vault"];

    assert_eq!(vault.dependencies, vec!["Ownable".to_string()]);
    assert!(vault.state_vars.contains_key("total"));
    assert!(vault.state_vars.contains_key("balances"));
    assert!(vault.mappings.contains_key("balances"));
    assert!(!vault.mappings.contains_key("total"));
    assert!(vault.modifiers.contains_key("onlyOwner"));
    assert_eq!(vault.events.len(), 1);
    assert_eq!(vault.events[0].name, "Deposited");
    assert!(vault.events[0].arguments.contains_key("who"));
    Ok(())
}

#[test]
fn test_special_functions_get_synthetic_names() -> Result<()> {
    let unit = parse_fixture()?;
    let vault = &unit.contracts["Vault"];

    let names: Vec<&str> = vault.functions.iter().map(|f| f.name.as_str()).collect();
    assert!(names.contains(&"__constructor__"));
    assert!(names.contains(&"__fallback__"));
    assert!(names.contains(&"__receiveEther__"));
    assert!(names.contains(&"initialize"));

    assert_eq!(vault.constructor_fn().unwrap().name, "__constructor__");
    assert_eq!(vault.fallback_fn().unwrap().name, "__fallback__");
    assert_eq!(vault.receive_fn().unwrap().name, "__receiveEther__");
    Ok(())
}

#[test]
fn test_calls_to() -> Result<()> {
    let unit = parse_fixture()?;
    let vault = &unit.contracts["Vault"];

    let ctor = vault.constructor_fn().unwrap();
    assert!(ctor.calls_to("initialize"));
    assert!(!ctor.calls_to("deposit"));

    // member access resolves to the member name
    let sweep = vault
        .functions
        .iter()
        .find(|f| f.name == "sweep")
        .unwrap();
    assert!(sweep.calls_to("transfer"));

    // empty bodies have no calls
    let fallback = vault.fallback_fn().unwrap();
    assert!(!fallback.calls_to("initialize"));
    Ok(())
}

#[test]
fn test_function_attributes() -> Result<()> {
    let unit = parse_fixture()?;
    let vault = &unit.contracts["Vault"];

    let deposit = vault
        .functions
        .iter()
        .find(|f| f.name == "deposit")
        .unwrap();
    assert_eq!(deposit.visibility, "external");
    assert_eq!(deposit.state_mutability, "payable");
    assert!(deposit.has_body);

    let hook = unit.contracts["Base"]
        .functions
        .iter()
        .find(|f| f.name == "hook")
        .unwrap();
    assert!(!hook.has_body);
    Ok(())
}

#[test]
fn test_later_contract_with_same_name_wins() -> Result<()> {
    let source = r#"
contract Token {
    function first() public {}
}
contract Token {
    function second() public {}
}
"#;
    let unit = SourceUnit::from_source(Path::new("dup.sol"), source.to_string())?;
    assert_eq!(unit.contracts.len(), 1);
    let token = &unit.contracts["Token"];
    assert!(token.functions.iter().any(|f| f.name == "second"));
    assert!(!token.functions.iter().any(|f| f.name == "first"));
    Ok(())
}

#[test]
fn test_non_contract_declaration_is_rejected() -> Result<()> {
    let source = "struct Point { uint256 x; uint256 y; }";
    let tree = parse(source)?;
    let node = tree.root_node().named_child(0).unwrap();
    assert_eq!(node.kind(), "struct_declaration");

    let err = Contract::from_node(node, source).unwrap_err();
    assert!(matches!(err, EngineError::ModelIntegrity(_)));
    Ok(())
}

#[test]
fn test_file_level_data_declarations_are_not_contracts() -> Result<()> {
    let source = r#"
struct Point { uint256 x; }
enum Mode { On, Off }
contract Holder {}
"#;
    let unit = SourceUnit::from_source(Path::new("free.sol"), source.to_string())?;
    assert_eq!(unit.contracts.len(), 1);
    assert!(unit.contracts.contains_key("Holder"));
    Ok(())
}

#[test]
fn test_contract_node_roundtrip() -> Result<()> {
    let unit = parse_fixture()?;
    let vault = &unit.contracts["Vault"];
    let node = unit.contract_node(vault).unwrap();
    assert_eq!(node.kind(), "contract_declaration");
    assert_eq!((node.start_byte(), node.end_byte()), vault.byte_range);
    Ok(())
}
