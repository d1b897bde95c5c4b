//! UOR (Unary Operator Replacement) mutation operator.
//!
//! Standard table removes the operator:
//! - `not x` -> `x`, `-x` -> `x`
//!
//! Aggressive table collapses the expression to a constant:
//! - `not x` -> `true`, `-x` -> `0`

use crate::lang::{expr_rewrites, Expr, FunctionDef, Rewrite, UnaryOp};

use super::super::operator::{Category, MutationOperator, RuleVariant};

/// UOR (Unary Operator Replacement) operator.
pub struct UnaryMutationOperator;

impl MutationOperator for UnaryMutationOperator {
    fn name(&self) -> &'static str {
        "UOR"
    }

    fn category(&self) -> Category {
        Category::Unary
    }

    fn description(&self) -> &'static str {
        "Unary Operator Replacement - removes negation and logical not"
    }

    fn mutations(&self, func: &FunctionDef, variant: RuleVariant) -> Vec<Rewrite> {
        expr_rewrites(func, |e| match e {
            Expr::Unary(op, operand) => match variant {
                RuleVariant::Standard => vec![(**operand).clone()],
                RuleVariant::Aggressive => match op {
                    UnaryOp::Not => vec![Expr::Bool(true)],
                    UnaryOp::Neg => vec![Expr::Int(0)],
                },
            },
            _ => vec![],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parse_function;

    #[test]
    fn test_unary_operator_name() {
        let op = UnaryMutationOperator;
        assert_eq!(op.name(), "UOR");
        assert_eq!(op.category(), Category::Unary);
    }

    #[test]
    fn test_removes_negation() {
        let func = parse_function("fn f(a) { return -a; }").unwrap();
        let op = UnaryMutationOperator;
        let mutants = op.mutations(&func, RuleVariant::Standard);
        assert_eq!(mutants.len(), 1);
        assert_eq!(mutants[0].detail, "-a -> a");
    }

    #[test]
    fn test_removes_logical_not() {
        let func = parse_function("fn f(a) { return not a; }").unwrap();
        let op = UnaryMutationOperator;
        let mutants = op.mutations(&func, RuleVariant::Standard);
        assert_eq!(mutants[0].detail, "not a -> a");
    }

    #[test]
    fn test_aggressive_collapses_to_constant() {
        let func = parse_function("fn f(a) { return not a; }").unwrap();
        let op = UnaryMutationOperator;
        let mutants = op.mutations(&func, RuleVariant::Aggressive);
        assert_eq!(mutants[0].detail, "not a -> true");

        let func = parse_function("fn f(a) { return -a; }").unwrap();
        let mutants = op.mutations(&func, RuleVariant::Aggressive);
        assert_eq!(mutants[0].detail, "-a -> 0");
    }

    #[test]
    fn test_no_unary_no_candidates() {
        let func = parse_function("fn f(a, b) { return a + b; }").unwrap();
        let op = UnaryMutationOperator;
        assert!(op.mutations(&func, RuleVariant::Standard).is_empty());
    }
}
