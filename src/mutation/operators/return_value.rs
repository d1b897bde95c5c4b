//! RVR (Return Value Replacement) mutation operator.
//!
//! Standard table replaces a returned expression with the neutral sentinel
//! `none`, one return statement at a time; the rest of the tree keeps its
//! shape. Aggressive table flips the returned value instead: boolean
//! literals are negated, integer literals incremented, anything else
//! arithmetically negated.

use std::sync::Arc;

use crate::lang::{return_rewrites, Expr, FunctionDef, Rewrite, UnaryOp};

use super::super::operator::{Category, MutationOperator, RuleVariant};

/// RVR (Return Value Replacement) operator.
pub struct ReturnValueOperator;

impl MutationOperator for ReturnValueOperator {
    fn name(&self) -> &'static str {
        "RVR"
    }

    fn category(&self) -> Category {
        Category::ReturnValue
    }

    fn description(&self) -> &'static str {
        "Return Value Replacement - replaces or flips returned expressions"
    }

    fn mutations(&self, func: &FunctionDef, variant: RuleVariant) -> Vec<Rewrite> {
        return_rewrites(func, |e| match variant {
            RuleVariant::Standard => Some(Expr::None),
            RuleVariant::Aggressive => Some(flip(e)),
        })
    }
}

fn flip(e: &Expr) -> Expr {
    match e {
        Expr::Bool(b) => Expr::Bool(!b),
        Expr::Int(n) => match n.checked_add(1) {
            Some(v) => Expr::Int(v),
            None => Expr::Int(-n),
        },
        Expr::Float(x) => Expr::Float(-x),
        other => Expr::Unary(UnaryOp::Neg, Arc::new(other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parse_function;

    #[test]
    fn test_return_value_operator_name() {
        let op = ReturnValueOperator;
        assert_eq!(op.name(), "RVR");
        assert_eq!(op.category(), Category::ReturnValue);
    }

    #[test]
    fn test_standard_replaces_with_sentinel() {
        let func = parse_function("fn f(x) { return x; }").unwrap();
        let op = ReturnValueOperator;
        let mutants = op.mutations(&func, RuleVariant::Standard);
        assert_eq!(mutants.len(), 1);
        assert_eq!(mutants[0].detail, "return x -> return none");
        assert!(mutants[0].func.source().contains("return none;"));
    }

    #[test]
    fn test_sentinel_is_the_only_difference() {
        let func = parse_function(
            "fn f(x) {\n    let y = x * 2;\n    return y;\n}",
        )
        .unwrap();
        let op = ReturnValueOperator;
        let mutants = op.mutations(&func, RuleVariant::Standard);
        assert_eq!(mutants.len(), 1);
        let expected = func.source().replace("return y;", "return none;");
        assert_eq!(mutants[0].func.source(), expected);
    }

    #[test]
    fn test_one_return_at_a_time() {
        let func = parse_function(
            "fn f(x) { if x > 0 { return x; } return -x; }",
        )
        .unwrap();
        let op = ReturnValueOperator;
        let mutants = op.mutations(&func, RuleVariant::Standard);
        assert_eq!(mutants.len(), 2);
        // Each mutant keeps exactly one original return.
        assert!(mutants[0].func.source().contains("return -x;"));
        assert!(mutants[1].func.source().contains("return x;"));
    }

    #[test]
    fn test_aggressive_flips() {
        let op = ReturnValueOperator;

        let func = parse_function("fn f() { return true; }").unwrap();
        let mutants = op.mutations(&func, RuleVariant::Aggressive);
        assert_eq!(mutants[0].detail, "return true -> return false");

        let func = parse_function("fn f() { return 41; }").unwrap();
        let mutants = op.mutations(&func, RuleVariant::Aggressive);
        assert_eq!(mutants[0].detail, "return 41 -> return 42");

        let func = parse_function("fn f(x) { return x; }").unwrap();
        let mutants = op.mutations(&func, RuleVariant::Aggressive);
        assert_eq!(mutants[0].detail, "return x -> return -x");
    }

    #[test]
    fn test_bare_return_untouched() {
        let func = parse_function("fn f(x) { x + 1; return; }").unwrap();
        let op = ReturnValueOperator;
        assert!(op.mutations(&func, RuleVariant::Standard).is_empty());
    }
}
