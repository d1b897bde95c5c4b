//! AOR (Arithmetic Operator Replacement) mutation operator.
//!
//! Standard table:
//! - `+` <-> `-`, `*` <-> `/`, `%` -> `*`
//!
//! Aggressive table reaches for a more distant operator:
//! - `+` -> `*`, `-` -> `/`, `*` -> `-`, `/` -> `+`, `%` -> `-`

use crate::lang::{expr_rewrites, BinOp, Expr, FunctionDef, Rewrite};

use super::super::operator::{Category, MutationOperator, RuleVariant};

/// AOR (Arithmetic Operator Replacement) operator.
pub struct ArithmeticOperator;

impl MutationOperator for ArithmeticOperator {
    fn name(&self) -> &'static str {
        "AOR"
    }

    fn category(&self) -> Category {
        Category::Arithmetic
    }

    fn description(&self) -> &'static str {
        "Arithmetic Operator Replacement - replaces arithmetic operators"
    }

    fn mutations(&self, func: &FunctionDef, variant: RuleVariant) -> Vec<Rewrite> {
        expr_rewrites(func, |e| match e {
            Expr::Binary(op, lhs, rhs) => {
                let replacement = match variant {
                    RuleVariant::Standard => standard_replacement(*op),
                    RuleVariant::Aggressive => aggressive_replacement(*op),
                };
                vec![Expr::Binary(replacement, lhs.clone(), rhs.clone())]
            }
            _ => vec![],
        })
    }
}

fn standard_replacement(op: BinOp) -> BinOp {
    match op {
        BinOp::Add => BinOp::Sub,
        BinOp::Sub => BinOp::Add,
        BinOp::Mul => BinOp::Div,
        BinOp::Div => BinOp::Mul,
        BinOp::Mod => BinOp::Mul,
    }
}

fn aggressive_replacement(op: BinOp) -> BinOp {
    match op {
        BinOp::Add => BinOp::Mul,
        BinOp::Sub => BinOp::Div,
        BinOp::Mul => BinOp::Sub,
        BinOp::Div => BinOp::Add,
        BinOp::Mod => BinOp::Sub,
    }
}
