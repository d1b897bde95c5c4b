//! Deadline-bounded sandbox for running generated and mutated code.
//!
//! One execution contract covers all three callable kinds the engine runs:
//! the original function, a mutant, and an assertion. Every call constructs a
//! fresh environment holding only the enumerated bindings (parameters, the
//! bound `result`, the builtin allow-list), so no state leaks between calls
//! and nothing from the enclosing process is reachable. A call that exceeds
//! its deadline is aborted and reported as `TimedOut`, a terminal outcome
//! that is never retried.

mod interp;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::{ErrorKind, TestCase, Value};
use crate::lang::{Expr, FunctionDef};

use interp::{Interp, Interrupt};

/// Default cap on self-recursion depth.
const DEFAULT_MAX_DEPTH: usize = 64;

/// The classified result of one sandboxed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum ExecutionOutcome {
    /// The callable ran to completion and produced a value.
    Returned(Value),
    /// The callable raised a runtime error.
    Raised(ErrorKind),
    /// The deadline elapsed before the callable finished.
    TimedOut,
}

impl ExecutionOutcome {
    /// True if the callable completed normally.
    pub fn is_returned(&self) -> bool {
        matches!(self, Self::Returned(_))
    }

    /// True if the deadline elapsed.
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }

    /// Behavioral match used by the equivalence filter: equal returned
    /// values, the same raised kind, or both timed out. The timeout-timeout
    /// case is deliberately conservative: neither side is informative, so
    /// it counts as matching.
    pub fn matches(&self, other: &ExecutionOutcome) -> bool {
        match (self, other) {
            (Self::Returned(a), Self::Returned(b)) => a.eq_value(b),
            (Self::Raised(a), Self::Raised(b)) => a == b,
            (Self::TimedOut, Self::TimedOut) => true,
            _ => false,
        }
    }
}

/// Explicit name bindings for an assertion evaluation.
///
/// Built from an enumerated set only; there is no way to inherit names from
/// the surrounding process.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    map: HashMap<Arc<str>, Value>,
}

impl Bindings {
    /// Empty bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the function's parameters to a test case's arguments and
    /// `result` to the observed output, the standard assertion context.
    pub fn for_assertion(params: &[Arc<str>], case: &TestCase, result: Value) -> Self {
        let mut bindings = Self::new();
        for (param, arg) in params.iter().zip(&case.args) {
            bindings.bind(param.clone(), arg.clone());
        }
        bindings.bind(Arc::from("result"), result);
        bindings
    }

    /// Add a binding.
    pub fn bind(&mut self, name: Arc<str>, value: Value) -> &mut Self {
        self.map.insert(name, value);
        self
    }

    /// Look up a binding.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name)
    }
}

/// Sandboxed executor: runs any single callable under a hard deadline.
#[derive(Debug, Clone)]
pub struct Sandbox {
    deadline: Duration,
    max_depth: usize,
}

impl Sandbox {
    /// Create a sandbox with the given per-call deadline.
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the self-recursion depth cap.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// The configured per-call deadline.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Call a function (original or mutant) with positional arguments.
    pub fn call(&self, func: &FunctionDef, args: &[Value]) -> ExecutionOutcome {
        let interp = Interp::new(Instant::now() + self.deadline, self.max_depth, Some(func));
        match interp.call(func, args, 0) {
            Ok(value) => ExecutionOutcome::Returned(value),
            Err(Interrupt::Raised(kind)) => ExecutionOutcome::Raised(kind),
            Err(Interrupt::TimedOut) => ExecutionOutcome::TimedOut,
        }
    }

    /// Evaluate an assertion expression against explicit bindings.
    pub fn eval_assertion(&self, assertion: &Expr, bindings: &Bindings) -> ExecutionOutcome {
        let interp = Interp::new(Instant::now() + self.deadline, self.max_depth, None);
        let mut env = bindings.map.clone();
        match interp.eval_with_env(assertion, &mut env) {
            Ok(value) => ExecutionOutcome::Returned(value),
            Err(Interrupt::Raised(kind)) => ExecutionOutcome::Raised(kind),
            Err(Interrupt::TimedOut) => ExecutionOutcome::TimedOut,
        }
    }
}
