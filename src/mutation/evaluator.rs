//! Kill-rate evaluation.
//!
//! For each surviving mutant the assertion under test is exercised over a
//! bounded sample of corpus cases. A case kills the mutant when the mutant
//! call raises or times out, or when the assertion raises, times out, or
//! returns a falsy value. Evaluation of a mutant stops at its first killing
//! case; evaluation across mutants is embarrassingly parallel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::TestCase;
use crate::lang::Expr;
use crate::sandbox::{Bindings, ExecutionOutcome, Sandbox};

use super::mutant::{EquivalenceStatus, Mutant};

/// One consulted test case in a kill record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Index of the case in the corpus.
    pub case_index: usize,
    /// Outcome of running the mutant on the case's arguments.
    pub mutant_outcome: ExecutionOutcome,
    /// Outcome of the assertion, absent when the mutant call itself already
    /// decided the case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_outcome: Option<ExecutionOutcome>,
}

/// Per-mutant evaluation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KillRecord {
    /// Mutant identifier.
    pub mutant_id: String,
    /// Carried through from generation so downstream consumers can
    /// distinguish genuine mutants from fallback duplicates.
    pub flagged_duplicate: bool,
    /// True when some consulted case killed the mutant.
    pub killed: bool,
    /// The cases consulted, up to and including the killing one.
    pub cases: Vec<CaseRecord>,
}

/// Aggregate result for one (function, strategy) unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Killed mutants / total mutants, in percent.
    pub kill_rate: f64,
    /// Number of killed mutants.
    pub killed: usize,
    /// Number of mutants evaluated.
    pub total: usize,
    /// Per-mutant records.
    pub records: Vec<KillRecord>,
}

/// Evaluator computing kill rates over a bounded case sample.
pub struct KillRateEvaluator {
    sample: usize,
}

impl Default for KillRateEvaluator {
    fn default() -> Self {
        Self::new(100)
    }
}

impl KillRateEvaluator {
    /// Create an evaluator consulting at most `sample` cases per mutant.
    pub fn new(sample: usize) -> Self {
        Self { sample }
    }

    /// Evaluate an assertion against every mutant in the batch.
    pub fn evaluate(
        &self,
        mutants: &[Mutant],
        assertion: &Expr,
        corpus: &[TestCase],
        sandbox: &Sandbox,
    ) -> EvaluationSummary {
        debug_assert!(
            mutants
                .iter()
                .all(|m| m.equivalence != EquivalenceStatus::Equivalent),
            "equivalent mutants must never reach the evaluator"
        );

        let sample = self.sample.min(corpus.len());
        let records: Vec<KillRecord> = mutants
            .par_iter()
            .map(|mutant| self.evaluate_mutant(mutant, assertion, &corpus[..sample], sandbox))
            .collect();

        let killed = records.iter().filter(|r| r.killed).count();
        let total = mutants.len();
        let kill_rate = if total > 0 {
            killed as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        debug!(killed, total, kill_rate, "kill-rate evaluation complete");

        EvaluationSummary {
            kill_rate,
            killed,
            total,
            records,
        }
    }

    fn evaluate_mutant(
        &self,
        mutant: &Mutant,
        assertion: &Expr,
        cases: &[TestCase],
        sandbox: &Sandbox,
    ) -> KillRecord {
        let mut record = KillRecord {
            mutant_id: mutant.id.clone(),
            flagged_duplicate: mutant.flagged_duplicate,
            killed: false,
            cases: Vec::new(),
        };

        for (case_index, case) in cases.iter().enumerate() {
            let mutant_outcome = sandbox.call(&mutant.func, &case.args);
            let (assertion_outcome, killed) = match &mutant_outcome {
                ExecutionOutcome::Returned(value) => {
                    let bindings =
                        Bindings::for_assertion(&mutant.func.params, case, value.clone());
                    let outcome = sandbox.eval_assertion(assertion, &bindings);
                    let killed = match &outcome {
                        ExecutionOutcome::Returned(v) => !v.truthy(),
                        ExecutionOutcome::Raised(_) | ExecutionOutcome::TimedOut => true,
                    };
                    (Some(outcome), killed)
                }
                // A mutant that crashes or hangs is observably broken.
                ExecutionOutcome::Raised(_) | ExecutionOutcome::TimedOut => (None, true),
            };
            record.cases.push(CaseRecord {
                case_index,
                mutant_outcome,
                assertion_outcome,
            });
            if killed {
                record.killed = true;
                break;
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::core::Value;
    use crate::lang::{parse_assertion, parse_function};
    use crate::mutation::mutant::{GenerationTier, Mutant, RuleApplication};

    fn sandbox() -> Sandbox {
        Sandbox::new(Duration::from_millis(100))
    }

    fn mutant(src: &str) -> Mutant {
        Mutant::new(
            "m-1",
            parse_function(src).unwrap(),
            GenerationTier::Standard,
            vec![RuleApplication::new("AOR", 0, "test")],
        )
    }

    fn corpus() -> Vec<TestCase> {
        vec![
            TestCase::new(vec![Value::Int(2), Value::Int(3)]),
            TestCase::new(vec![Value::Int(0), Value::Int(0)]),
        ]
    }

    #[test]
    fn test_sum_mutant_killed_by_exact_assertion() {
        // add(a, b) mutated to a - b; on (2, 3) the mutant returns -1,
        // result == a + b binds (a=2, b=3, result=-1) and evaluates false.
        let m = mutant("fn add(a, b) { return a - b; }");
        let assertion = parse_assertion("result == a + b").unwrap();
        let summary =
            KillRateEvaluator::new(100).evaluate(&[m], &assertion, &corpus(), &sandbox());

        assert_eq!(summary.killed, 1);
        assert!((summary.kill_rate - 100.0).abs() < f64::EPSILON);
        let record = &summary.records[0];
        assert!(record.killed);
        assert_eq!(record.cases.len(), 1);
        assert_eq!(
            record.cases[0].assertion_outcome,
            Some(ExecutionOutcome::Returned(Value::Bool(false)))
        );
    }

    #[test]
    fn test_tautological_assertion_kills_nothing() {
        let mutants = vec![
            mutant("fn add(a, b) { return a - b; }"),
            mutant("fn add(a, b) { return a * b; }"),
        ];
        let assertion = parse_assertion("true").unwrap();
        let summary =
            KillRateEvaluator::new(100).evaluate(&mutants, &assertion, &corpus(), &sandbox());

        assert_eq!(summary.killed, 0);
        assert_eq!(summary.kill_rate, 0.0);
        // Every case was consulted since nothing killed.
        assert!(summary.records.iter().all(|r| r.cases.len() == 2));
    }

    #[test]
    fn test_contradictory_assertion_kills_everything() {
        let mutants = vec![
            mutant("fn add(a, b) { return a - b; }"),
            mutant("fn add(a, b) { return a * b; }"),
        ];
        let assertion = parse_assertion("false").unwrap();
        let summary =
            KillRateEvaluator::new(100).evaluate(&mutants, &assertion, &corpus(), &sandbox());

        assert_eq!(summary.killed, 2);
        assert!((summary.kill_rate - 100.0).abs() < f64::EPSILON);
        // Short-circuit: one case each was enough.
        assert!(summary.records.iter().all(|r| r.cases.len() == 1));
    }

    #[test]
    fn test_crashing_mutant_counts_as_killed() {
        let m = mutant("fn add(a, b) { return a / b; }");
        let corpus = vec![TestCase::new(vec![Value::Int(1), Value::Int(0)])];
        let assertion = parse_assertion("true").unwrap();
        let summary = KillRateEvaluator::new(100).evaluate(&[m], &assertion, &corpus, &sandbox());

        assert_eq!(summary.killed, 1);
        let record = &summary.records[0];
        assert!(record.cases[0].assertion_outcome.is_none());
        assert!(matches!(
            record.cases[0].mutant_outcome,
            ExecutionOutcome::Raised(_)
        ));
    }

    #[test]
    fn test_hanging_mutant_counts_as_killed() {
        let m = mutant("fn add(a, b) { while true { a = a + 0; } return a; }");
        let assertion = parse_assertion("true").unwrap();
        let summary =
            KillRateEvaluator::new(100).evaluate(&[m], &assertion, &corpus(), &sandbox());

        assert_eq!(summary.killed, 1);
        assert_eq!(
            summary.records[0].cases[0].mutant_outcome,
            ExecutionOutcome::TimedOut
        );
    }

    #[test]
    fn test_assertion_raising_counts_as_killed() {
        let m = mutant("fn add(a, b) { return a + b; }");
        let assertion = parse_assertion("result == undefined_helper(a)").unwrap();
        let summary =
            KillRateEvaluator::new(100).evaluate(&[m], &assertion, &corpus(), &sandbox());
        assert_eq!(summary.killed, 1);
    }

    #[test]
    fn test_sample_bound_respected() {
        let m = mutant("fn add(a, b) { return a + b; }");
        let big_corpus: Vec<TestCase> = (0..500)
            .map(|i| TestCase::new(vec![Value::Int(i), Value::Int(i)]))
            .collect();
        let assertion = parse_assertion("true").unwrap();
        let summary =
            KillRateEvaluator::new(100).evaluate(&[m], &assertion, &big_corpus, &sandbox());
        assert_eq!(summary.records[0].cases.len(), 100);
    }
}
