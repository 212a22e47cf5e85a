//! Numeric evaluation of infix expressions.
//!
//! Supports decimal and hex literals, `+ - * / % ^`, unary minus and parentheses, with
//! the usual precedence (`^` binds tightest and is right-associative). Anything else,
//! including identifiers, is a parse error: callers use that to tell numeric expressions
//! from symbolic ones.

use pest::iterators::Pairs;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "expr.pest"]
struct ExprParser;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid literal: {0}")]
    Literal(String),
    #[error("Result is not finite")]
    NotFinite,
}

fn pratt() -> PrattParser<Rule> {
    PrattParser::new()
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::subtract, Assoc::Left))
        .op(Op::infix(Rule::multiply, Assoc::Left)
            | Op::infix(Rule::divide, Assoc::Left)
            | Op::infix(Rule::modulo, Assoc::Left))
        .op(Op::prefix(Rule::negate))
        .op(Op::infix(Rule::power, Assoc::Right))
}

/// Evaluate `source` to a finite number.
pub fn evaluate(source: &str) -> Result<f64, ExprError> {
    let mut pairs = ExprParser::parse(Rule::equation, source).map_err(|e| ExprError::Parse(e.to_string()))?;
    let expr = pairs.next().ok_or_else(|| ExprError::Parse("empty expression".to_string()))?;
    let value = eval_pairs(expr.into_inner(), &pratt())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExprError::NotFinite)
    }
}

/// True when `source` evaluates to a finite number.
pub fn is_numeric(source: &str) -> bool {
    evaluate(source).is_ok()
}

fn eval_pairs(pairs: Pairs<Rule>, pratt: &PrattParser<Rule>) -> Result<f64, ExprError> {
    pratt
        .map_primary(|primary| match primary.as_rule() {
            Rule::number => primary
                .as_str()
                .parse::<f64>()
                .map_err(|_| ExprError::Literal(primary.as_str().to_string())),
            Rule::hex => {
                let digits = &primary.as_str()[2..];
                u64::from_str_radix(digits, 16)
                    .map(|v| v as f64)
                    .map_err(|_| ExprError::Literal(primary.as_str().to_string()))
            }
            Rule::expr => eval_pairs(primary.into_inner(), pratt),
            rule => Err(ExprError::Parse(format!("unexpected {:?}", rule))),
        })
        .map_prefix(|op, rhs| match op.as_rule() {
            Rule::negate => Ok(-rhs?),
            rule => Err(ExprError::Parse(format!("unexpected prefix {:?}", rule))),
        })
        .map_infix(|lhs, op, rhs| {
            let (lhs, rhs) = (lhs?, rhs?);
            match op.as_rule() {
                Rule::add => Ok(lhs + rhs),
                Rule::subtract => Ok(lhs - rhs),
                Rule::multiply => Ok(lhs * rhs),
                Rule::divide => Ok(lhs / rhs),
                Rule::modulo => Ok(lhs % rhs),
                Rule::power => Ok(lhs.powf(rhs)),
                rule => Err(ExprError::Parse(format!("unexpected operator {:?}", rule))),
            }
        })
        .parse(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence() {
        assert_eq!(evaluate("4+3").unwrap(), 7.0);
        assert_eq!(evaluate("2+3*4").unwrap(), 14.0);
        assert_eq!(evaluate("(2+3)*4").unwrap(), 20.0);
        assert_eq!(evaluate("2^3^2").unwrap(), 512.0);
        assert_eq!(evaluate("-2^2").unwrap(), -4.0);
        assert_eq!(evaluate("10-4-3").unwrap(), 3.0);
        assert_eq!(evaluate("7/2").unwrap(), 3.5);
        assert_eq!(evaluate("7 % 4").unwrap(), 3.0);
    }

    #[test]
    fn literals() {
        assert_eq!(evaluate("0x10 + 1").unwrap(), 17.0);
        assert_eq!(evaluate(" 1.5e1 ").unwrap(), 15.0);
        assert_eq!(evaluate(".5*4").unwrap(), 2.0);
        assert_eq!(evaluate("2*-3").unwrap(), -6.0);
    }

    #[test]
    fn symbols_and_garbage_are_not_numeric() {
        assert!(!is_numeric("N"));
        assert!(!is_numeric("2*N+1"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("3+"));
        assert!(!is_numeric("(1+2"));
    }

    #[test]
    fn division_by_zero_is_not_finite() {
        assert_eq!(evaluate("1/0"), Err(ExprError::NotFinite));
    }
}
