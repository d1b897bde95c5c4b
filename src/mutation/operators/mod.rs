//! Built-in mutation operators.
//!
//! Operators are named using standard mutation testing conventions:
//! - ROR: Relational Operator Replacement
//! - AOR: Arithmetic Operator Replacement
//! - LOR: Logical Operator Replacement
//! - CRR: Constant Replacement
//! - UOR: Unary Operator Replacement
//! - RVR: Return Value Replacement
//!
//! Each operator carries a standard and an aggressive rule table; see the
//! individual modules for the exact rewrites.

mod arithmetic;
mod constant;
mod logical;
mod relational;
mod return_value;
mod unary;

pub use arithmetic::ArithmeticOperator;
pub use constant::ConstantOperator;
pub use logical::LogicalOperator;
pub use relational::RelationalOperator;
pub use return_value::ReturnValueOperator;
pub use unary::UnaryMutationOperator;

use super::operator::OperatorRegistry;

/// Create a registry with all six operator categories, in the order the
/// generator enumerates them.
pub fn default_registry() -> OperatorRegistry {
    let mut registry = OperatorRegistry::new();
    registry.register(Box::new(RelationalOperator));
    registry.register(Box::new(ArithmeticOperator));
    registry.register(Box::new(LogicalOperator));
    registry.register(Box::new(ConstantOperator));
    registry.register(Box::new(UnaryMutationOperator));
    registry.register(Box::new(ReturnValueOperator));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::operator::RuleVariant;

    #[test]
    fn test_default_registry_has_six_operators() {
        let registry = default_registry();
        assert_eq!(registry.operators().len(), 6);
    }

    #[test]
    fn test_default_registry_operator_names() {
        let registry = default_registry();
        let names: Vec<&str> = registry.operators().iter().map(|op| op.name()).collect();
        for expected in ["ROR", "AOR", "LOR", "CRR", "UOR", "RVR"] {
            assert!(names.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn test_all_operators_total_on_trivial_function() {
        // A function with no matching sites yields zero candidates from every
        // operator, and none of them error.
        let func = crate::lang::parse_function("fn id(x) { let y = x; y; }").unwrap();
        let registry = default_registry();
        for op in registry.operators() {
            for variant in [RuleVariant::Standard, RuleVariant::Aggressive] {
                let _ = op.mutations(&func, variant);
            }
        }
    }

    #[test]
    fn test_rules_are_deterministic() {
        let func = crate::lang::parse_function("fn f(a, b) { return a + b * 2; }").unwrap();
        let registry = default_registry();
        for op in registry.operators() {
            let first = op.mutations(&func, RuleVariant::Standard);
            let second = op.mutations(&func, RuleVariant::Standard);
            assert_eq!(first.len(), second.len());
            for (a, b) in first.iter().zip(&second) {
                assert_eq!(a.detail, b.detail);
                assert_eq!(a.func.fingerprint(), b.func.fingerprint());
            }
        }
    }
}
