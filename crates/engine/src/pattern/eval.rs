//! Evaluator for compiled patterns against one scope context.
//!
//! Field and method access is whitelisted per entity; anything outside the
//! whitelist is an evaluation error surfaced as a rule-execution failure for
//! the file being processed. The evaluator reads only the lifted model and
//! the unit's source text. It is a best-effort sandbox against accidents,
//! not a security boundary: patterns still come from the operator, not from
//! untrusted input.

use thiserror::Error;

use crate::pattern::parser::{CmpOp, Expr, ScopeVar, Segment};
use crate::pattern::value::Value;
use crate::solidity::{Contract, FunctionDef, SourceUnit};

#[derive(Debug, Error)]
#[error("{0}")]
pub struct EvalError(String);

/// The entities a pattern may reference during one evaluation.
pub struct EvalScope<'a> {
    pub source_unit: &'a SourceUnit,
    pub contract: Option<&'a Contract>,
    pub function: Option<&'a FunctionDef>,
    pub modifier: Option<&'a FunctionDef>,
}

pub fn eval(expr: &Expr, scope: &EvalScope<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Not(inner) => Ok(Value::Bool(!eval(inner, scope)?.truthy())),
        Expr::And(lhs, rhs) => {
            let l = eval(lhs, scope)?;
            if !l.truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(eval(rhs, scope)?)
        }
        Expr::Or(lhs, rhs) => {
            let l = eval(lhs, scope)?;
            if l.truthy() {
                return Ok(l);
            }
            Ok(eval(rhs, scope)?)
        }
        Expr::Cmp(op, lhs, rhs) => compare(*op, eval(lhs, scope)?, eval(rhs, scope)?),
        Expr::Scope(var, segments) => eval_path(*var, segments, scope),
    }
}

fn compare(op: CmpOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    let result = match (op, &lhs, &rhs) {
        (CmpOp::Eq, _, _) => lhs == rhs,
        (CmpOp::Ne, _, _) => lhs != rhs,
        (_, Value::Num(a), Value::Num(b)) => match op {
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
            _ => unreachable!(),
        },
        (_, Value::Str(a), Value::Str(b)) => match op {
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
            _ => unreachable!(),
        },
        _ => {
            return Err(EvalError(format!(
                "cannot order {} against {}",
                lhs.type_name(),
                rhs.type_name()
            )))
        }
    };
    Ok(Value::Bool(result))
}

fn eval_path(
    var: ScopeVar,
    segments: &[Segment],
    scope: &EvalScope<'_>,
) -> Result<Value, EvalError> {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        // a bare scope variable asserts the entity is in scope
        None => {
            let present = match var {
                ScopeVar::SourceUnit => true,
                ScopeVar::Contract => scope.contract.is_some(),
                ScopeVar::Function => scope.function.is_some(),
                ScopeVar::Modifier => scope.modifier.is_some(),
            };
            return Ok(Value::Bool(present));
        }
    };

    let value = match var {
        ScopeVar::SourceUnit => source_unit_member(scope.source_unit, head)?,
        ScopeVar::Contract => {
            let contract = scope
                .contract
                .ok_or_else(|| EvalError("`contract` is not in scope".to_string()))?;
            contract_member(contract, head, scope)?
        }
        ScopeVar::Function | ScopeVar::Modifier => {
            let (label, entity) = if var == ScopeVar::Function {
                ("function", scope.function)
            } else {
                ("modifier", scope.modifier)
            };
            let def =
                entity.ok_or_else(|| EvalError(format!("`{label}` is not in scope")))?;
            function_member(def, head, scope)?
        }
    };

    rest.iter()
        .try_fold(value, |acc, seg| value_member(acc, seg, scope))
}

fn source_unit_member(unit: &SourceUnit, segment: &Segment) -> Result<Value, EvalError> {
    match segment {
        Segment::Field(name) if name == "filePath" => {
            Ok(Value::Str(unit.file_key()))
        }
        Segment::Call(name, args) if name == "getSource" && args.is_empty() => {
            Ok(Value::Str(unit.source().to_string()))
        }
        other => Err(unknown_member("sourceUnit", other)),
    }
}

fn contract_member(
    contract: &Contract,
    segment: &Segment,
    scope: &EvalScope<'_>,
) -> Result<Value, EvalError> {
    match segment {
        Segment::Field(name) if name == "name" => Ok(Value::Str(contract.name.clone())),
        Segment::Field(name) if name == "kind" => {
            Ok(Value::Str(contract.kind.as_str().to_string()))
        }
        Segment::Call(name, args) if name == "getSource" && args.is_empty() => {
            Ok(Value::Str(contract.source_slice(scope.source_unit)))
        }
        Segment::Call(name, args) if name == "inherits" => {
            let base = single_str_arg(args, scope)?;
            Ok(Value::Bool(contract.dependencies.iter().any(|d| *d == base)))
        }
        other => Err(unknown_member("contract", other)),
    }
}

fn function_member(
    def: &FunctionDef,
    segment: &Segment,
    scope: &EvalScope<'_>,
) -> Result<Value, EvalError> {
    match segment {
        Segment::Field(name) if name == "name" => Ok(Value::Str(def.name.clone())),
        Segment::Field(name) if name == "visibility" => {
            Ok(Value::Str(def.visibility.clone()))
        }
        Segment::Field(name) if name == "stateMutability" => {
            Ok(Value::Str(def.state_mutability.clone()))
        }
        Segment::Call(name, args) if name == "getSource" && args.is_empty() => {
            Ok(Value::Str(def.source_slice(scope.source_unit)))
        }
        Segment::Call(name, args) if name == "callsTo" => {
            let target = single_str_arg(args, scope)?;
            Ok(Value::Bool(def.calls_to(&target)))
        }
        Segment::Call(name, args) if name == "hasModifier" => {
            let target = single_str_arg(args, scope)?;
            Ok(Value::Bool(def.modifiers.contains_key(&target)))
        }
        other => Err(unknown_member("function", other)),
    }
}

/// Members available on intermediate values, i.e. string operations chained
/// after an entity accessor.
fn value_member(
    value: Value,
    segment: &Segment,
    scope: &EvalScope<'_>,
) -> Result<Value, EvalError> {
    let Value::Str(s) = value else {
        return Err(EvalError(format!(
            "no members on a {} value",
            value.type_name()
        )));
    };
    match segment {
        Segment::Field(name) if name == "length" => Ok(Value::Num(s.chars().count() as f64)),
        Segment::Call(name, args) if name == "includes" => {
            let needle = single_str_arg(args, scope)?;
            Ok(Value::Bool(s.contains(&needle)))
        }
        Segment::Call(name, args) if name == "startsWith" => {
            let needle = single_str_arg(args, scope)?;
            Ok(Value::Bool(s.starts_with(&needle)))
        }
        Segment::Call(name, args) if name == "endsWith" => {
            let needle = single_str_arg(args, scope)?;
            Ok(Value::Bool(s.ends_with(&needle)))
        }
        Segment::Call(name, args) if name == "toLowerCase" && args.is_empty() => {
            Ok(Value::Str(s.to_lowercase()))
        }
        Segment::Field(name) => Err(EvalError(format!("unknown string field `{name}`"))),
        Segment::Call(name, _) => Err(EvalError(format!("unknown string method `{name}`"))),
    }
}

fn single_str_arg(args: &[Expr], scope: &EvalScope<'_>) -> Result<String, EvalError> {
    let [arg] = args else {
        return Err(EvalError(format!(
            "expected exactly one argument, got {}",
            args.len()
        )));
    };
    match eval(arg, scope)? {
        Value::Str(s) => Ok(s),
        other => Err(EvalError(format!(
            "expected a string argument, got {}",
            other.type_name()
        ))),
    }
}

fn unknown_member(entity: &str, segment: &Segment) -> EvalError {
    match segment {
        Segment::Field(name) => EvalError(format!("unknown field `{entity}.{name}`")),
        Segment::Call(name, _) => EvalError(format!("unknown method `{entity}.{name}()`")),
    }
}
