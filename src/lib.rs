//! Mutscore - mutation-based completeness scoring for generated assertions.
//!
//! Mutscore measures how well a program assertion ("postcondition") detects
//! injected bugs. For a function under test it generates a bounded batch of
//! mutants by syntax-tree rewriting, filters out behaviorally-equivalent
//! ones on sampled inputs, executes the assertion against each survivor in a
//! deadline-bounded sandbox, and reports the fraction killed per
//! (function, strategy) pair.
//!
//! # Example
//!
//! ```
//! use mutscore::core::{TestCase, Value};
//! use mutscore::mutation::{Engine, FunctionUnderTest};
//!
//! let engine = Engine::new();
//! let function = FunctionUnderTest::parse("1", "fn add(a, b) { return a + b; }").unwrap();
//! let corpus = vec![TestCase::new(vec![Value::Int(2), Value::Int(3)])];
//! let result = engine.evaluate_unit(&function, "result == a + b", &corpus);
//! assert!(result.kill_rate.is_some());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod lang;
pub mod mutation;
pub mod report;
pub mod sandbox;

pub use config::EngineConfig;
pub use mutation::{Engine, FunctionUnderTest};
pub use report::CompletenessReport;
