//! Mutation operator trait and registry.

use crate::lang::{FunctionDef, Rewrite};

/// The six operator categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Relational,
    Arithmetic,
    Logical,
    Constant,
    Unary,
    ReturnValue,
}

/// Which rule table an operator applies.
///
/// Every operator carries a standard table and an aggressive one; the
/// generator exhausts all standard rules before reaching for aggressive
/// variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleVariant {
    Standard,
    Aggressive,
}

/// Trait for mutation operators.
///
/// An operator is total over the tree: offered a function with no matching
/// site, it returns an empty vector rather than failing. Rules are
/// deterministic and side-effect-free, so the same node always yields the
/// same rewrite.
pub trait MutationOperator: Send + Sync {
    /// Short name (e.g. "ROR", "AOR", "CRR").
    fn name(&self) -> &'static str;

    /// Operator category.
    fn category(&self) -> Category;

    /// Human-readable description of what the operator does.
    fn description(&self) -> &'static str;

    /// Enumerate every applicable single-site rewrite of `func` under the
    /// given rule table.
    fn mutations(&self, func: &FunctionDef, variant: RuleVariant) -> Vec<Rewrite>;
}

/// Registry of available mutation operators.
pub struct OperatorRegistry {
    operators: Vec<Box<dyn MutationOperator>>,
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            operators: Vec::new(),
        }
    }

    /// Register an operator.
    pub fn register(&mut self, operator: Box<dyn MutationOperator>) {
        self.operators.push(operator);
    }

    /// All registered operators, in registration order.
    pub fn operators(&self) -> &[Box<dyn MutationOperator>] {
        &self.operators
    }

    /// Operators filtered by name.
    pub fn get_by_names(&self, names: &[&str]) -> Vec<&dyn MutationOperator> {
        self.operators
            .iter()
            .filter(|op| names.contains(&op.name()))
            .map(|op| op.as_ref())
            .collect()
    }
}
