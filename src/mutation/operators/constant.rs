//! CRR (Constant Replacement) mutation operator.
//!
//! Standard table nudges integer literals:
//! - `0` -> `1`, `n` -> `n + 1`
//!
//! Aggressive table scales them: `n` -> `n * 2`. Rewrites that would be
//! identities (`0 * 2`) or overflow are skipped.

use crate::lang::{expr_rewrites, Expr, FunctionDef, Rewrite};

use super::super::operator::{Category, MutationOperator, RuleVariant};

/// CRR (Constant Replacement) operator.
pub struct ConstantOperator;

impl MutationOperator for ConstantOperator {
    fn name(&self) -> &'static str {
        "CRR"
    }

    fn category(&self) -> Category {
        Category::Constant
    }

    fn description(&self) -> &'static str {
        "Constant Replacement - nudges or scales integer literals"
    }

    fn mutations(&self, func: &FunctionDef, variant: RuleVariant) -> Vec<Rewrite> {
        expr_rewrites(func, |e| match e {
            Expr::Int(n) => {
                let replacement = match variant {
                    RuleVariant::Standard => n.checked_add(1),
                    RuleVariant::Aggressive => n.checked_mul(2),
                };
                match replacement {
                    Some(v) => vec![Expr::Int(v)],
                    None => vec![],
                }
            }
            _ => vec![],
        })
    }
}
