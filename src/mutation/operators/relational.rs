//! ROR (Relational Operator Replacement) mutation operator.
//!
//! Standard table swaps each comparison with its mirror:
//! - `>` <-> `<`, `>=` <-> `<=`, `==` <-> `!=`
//!
//! Aggressive table collapses inequalities to equality:
//! - `<`, `<=`, `>`, `>=`, `!=` -> `==`, `==` -> `!=`

use crate::lang::{expr_rewrites, CmpOp, Expr, FunctionDef, Rewrite};

use super::super::operator::{Category, MutationOperator, RuleVariant};

/// ROR (Relational Operator Replacement) operator.
pub struct RelationalOperator;

impl MutationOperator for RelationalOperator {
    fn name(&self) -> &'static str {
        "ROR"
    }

    fn category(&self) -> Category {
        Category::Relational
    }

    fn description(&self) -> &'static str {
        "Relational Operator Replacement - replaces comparison operators"
    }

    fn mutations(&self, func: &FunctionDef, variant: RuleVariant) -> Vec<Rewrite> {
        expr_rewrites(func, |e| match e {
            Expr::Compare(op, lhs, rhs) => {
                let replacement = match variant {
                    RuleVariant::Standard => standard_replacement(*op),
                    RuleVariant::Aggressive => aggressive_replacement(*op),
                };
                vec![Expr::Compare(replacement, lhs.clone(), rhs.clone())]
            }
            _ => vec![],
        })
    }
}

fn standard_replacement(op: CmpOp) -> CmpOp {
    match op {
        CmpOp::Gt => CmpOp::Lt,
        CmpOp::Lt => CmpOp::Gt,
        CmpOp::Ge => CmpOp::Le,
        CmpOp::Le => CmpOp::Ge,
        CmpOp::Eq => CmpOp::Ne,
        CmpOp::Ne => CmpOp::Eq,
    }
}

fn aggressive_replacement(op: CmpOp) -> CmpOp {
    match op {
        CmpOp::Eq => CmpOp::Ne,
        _ => CmpOp::Eq,
    }
}
