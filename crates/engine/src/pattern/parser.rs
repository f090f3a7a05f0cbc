//! Recursive-descent parser for the whitelisted pattern grammar.
//!
//! ```text
//! expr    := or
//! or      := and ( "||" and )*
//! and     := unary ( "&&" unary )*
//! unary   := "!" unary | cmp
//! cmp     := postfix ( ("==" | "!=" | "<" | "<=" | ">" | ">=") postfix )?
//! postfix := atom ( "." ident [ "(" args ")" ] )*
//! atom    := literal | scope-var | "(" expr ")"
//! ```
//!
//! The only allowed path roots are the four scope variables. Everything else
//! is a parse error, which keeps the evaluator closed over the semantic
//! model: no ambient state, no I/O, no general-purpose language.

use crate::pattern::lexer::{tokenize, Token};
use crate::pattern::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeVar {
    SourceUnit,
    Contract,
    Function,
    Modifier,
}

impl ScopeVar {
    fn from_ident(name: &str) -> Option<Self> {
        match name {
            "sourceUnit" => Some(Self::SourceUnit),
            "contract" => Some(Self::Contract),
            "_function" => Some(Self::Function),
            "modifier" => Some(Self::Modifier),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Field(String),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Scope(ScopeVar, Vec<Segment>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
}

pub fn parse(input: &str) -> Result<Expr, String> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    if let Some(tok) = parser.peek() {
        return Err(format!("unexpected trailing `{tok}`"));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        match self.next() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(format!("expected `{expected}`, found `{tok}`")),
            None => Err(format!("expected `{expected}`, found end of pattern")),
        }
    }

    fn expr(&mut self) -> Result<Expr, String> {
        self.or()
    }

    fn or(&mut self) -> Result<Expr, String> {
        let mut lhs = self.and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, String> {
        let mut lhs = self.unary()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, String> {
        if self.eat(&Token::Bang) {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        self.cmp()
    }

    fn cmp(&mut self) -> Result<Expr, String> {
        let lhs = self.postfix()?;
        let op = match self.peek() {
            Some(Token::Eq) => CmpOp::Eq,
            Some(Token::Ne) => CmpOp::Ne,
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::Le) => CmpOp::Le,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::Ge) => CmpOp::Ge,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.postfix()?;
        Ok(Expr::Cmp(op, Box::new(lhs), Box::new(rhs)))
    }

    fn postfix(&mut self) -> Result<Expr, String> {
        let atom = self.atom()?;
        let Expr::Scope(var, mut segments) = atom else {
            return Ok(atom);
        };
        while self.eat(&Token::Dot) {
            let name = match self.next() {
                Some(Token::Ident(name)) => name,
                Some(tok) => return Err(format!("expected member name, found `{tok}`")),
                None => return Err("expected member name after `.`".to_string()),
            };
            if self.eat(&Token::LParen) {
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.expr()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(Token::RParen)?;
                        break;
                    }
                }
                segments.push(Segment::Call(name, args));
            } else {
                segments.push(Segment::Field(name));
            }
        }
        Ok(Expr::Scope(var, segments))
    }

    fn atom(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::Num(n)) => Ok(Expr::Literal(Value::Num(n))),
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => match ScopeVar::from_ident(&name) {
                Some(var) => Ok(Expr::Scope(var, Vec::new())),
                None => Err(format!("unknown scope variable `{name}`")),
            },
            Some(tok) => Err(format!("unexpected `{tok}`")),
            None => Err("empty expression".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scope_comparison() {
        let expr = parse("contract.name == \"Foo\"").unwrap();
        assert_eq!(
            expr,
            Expr::Cmp(
                CmpOp::Eq,
                Box::new(Expr::Scope(
                    ScopeVar::Contract,
                    vec![Segment::Field("name".into())]
                )),
                Box::new(Expr::Literal(Value::Str("Foo".into()))),
            )
        );
    }

    #[test]
    fn parses_method_chain() {
        let expr = parse("contract.getSource().includes('selfdestruct')").unwrap();
        let Expr::Scope(ScopeVar::Contract, segments) = expr else {
            panic!("expected scope path");
        };
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn rejects_unknown_root() {
        assert!(parse("process.exit()").is_err());
    }

    #[test]
    fn parses_boolean_combination() {
        assert!(parse("_function.name == 'init' && _function.visibility == 'public'").is_ok());
    }
}
