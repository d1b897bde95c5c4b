//! LOR (Logical Operator Replacement) mutation operator.
//!
//! Standard table swaps the connective: `and` <-> `or`.
//! Aggressive table collapses the expression to its left operand, deleting
//! the right-hand condition entirely.

use crate::lang::{expr_rewrites, Expr, FunctionDef, LogicOp, Rewrite};

use super::super::operator::{Category, MutationOperator, RuleVariant};

/// LOR (Logical Operator Replacement) operator.
pub struct LogicalOperator;

impl MutationOperator for LogicalOperator {
    fn name(&self) -> &'static str {
        "LOR"
    }

    fn category(&self) -> Category {
        Category::Logical
    }

    fn description(&self) -> &'static str {
        "Logical Operator Replacement - swaps conjunction and disjunction"
    }

    fn mutations(&self, func: &FunctionDef, variant: RuleVariant) -> Vec<Rewrite> {
        expr_rewrites(func, |e| match e {
            Expr::Logic(op, lhs, rhs) => match variant {
                RuleVariant::Standard => {
                    let swapped = match op {
                        LogicOp::And => LogicOp::Or,
                        LogicOp::Or => LogicOp::And,
                    };
                    vec![Expr::Logic(swapped, lhs.clone(), rhs.clone())]
                }
                RuleVariant::Aggressive => vec![(**lhs).clone()],
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
    fn test_logical_operator_name() {
        let op = LogicalOperator;
        assert_eq!(op.name(), "LOR");
        assert_eq!(op.category(), Category::Logical);
    }

    #[test]
    fn test_standard_swaps_connective() {
        let func = parse_function("fn f(a, b) { return a > 0 and b > 0; }").unwrap();
        let op = LogicalOperator;
        let mutants = op.mutations(&func, RuleVariant::Standard);
        assert_eq!(mutants.len(), 1);
        assert!(mutants[0].func.source().contains("a > 0 or b > 0"));
    }

    #[test]
    fn test_aggressive_keeps_left_operand() {
        let func = parse_function("fn f(a, b) { return a > 0 and b > 0; }").unwrap();
        let op = LogicalOperator;
        let mutants = op.mutations(&func, RuleVariant::Aggressive);
        assert_eq!(mutants.len(), 1);
        assert_eq!(mutants[0].detail, "a > 0 and b > 0 -> a > 0");
    }

    #[test]
    fn test_nested_connectives_each_get_a_site() {
        let func =
            parse_function("fn f(a, b, c) { return a > 0 and b > 0 or c > 0; }").unwrap();
        let op = LogicalOperator;
        let mutants = op.mutations(&func, RuleVariant::Standard);
        assert_eq!(mutants.len(), 2);
    }

    #[test]
    fn test_no_logic_no_candidates() {
        let func = parse_function("fn add(a, b) { return a + b; }").unwrap();
        let op = LogicalOperator;
        assert!(op.mutations(&func, RuleVariant::Standard).is_empty());
        assert!(op.mutations(&func, RuleVariant::Aggressive).is_empty());
    }
}
