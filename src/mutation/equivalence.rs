//! Behavioral equivalence filtering.
//!
//! A candidate mutant is compared against the original on a small sample of
//! corpus inputs. If every sampled outcome matches (equal values, same raised
//! kind, or both timed out), the mutant is classified `Equivalent` and never
//! reaches the evaluator. The check is sampling, not proof: a mutant that
//! happens to agree on the sample still passes as equivalent.
//!
//! Two budgets bound the filter. Each side of a check runs under a short
//! per-check deadline, and the filter as a whole runs under a per-function
//! wall-clock budget. When the budget runs out, remaining candidates are
//! accepted as surviving by default and flagged unverified (fail-open).

use std::time::{Duration, Instant};

use tracing::debug;

use crate::core::TestCase;
use crate::lang::FunctionDef;
use crate::sandbox::{ExecutionOutcome, Sandbox};

use super::mutant::{EquivalenceStatus, Mutant};

/// Budgeted equivalence filter for one function's generation run.
pub struct EquivalenceFilter<'a> {
    original: &'a FunctionDef,
    corpus: &'a [TestCase],
    sandbox: Sandbox,
    sample: usize,
    budget: Duration,
    started: Instant,
    /// Outcomes of the original on sampled cases, computed once.
    original_outcomes: Vec<Option<ExecutionOutcome>>,
    checked: usize,
    equivalent: usize,
    unverified: usize,
}

impl<'a> EquivalenceFilter<'a> {
    /// Create a filter. `check_deadline` bounds each sandboxed call;
    /// `budget` bounds the filter across all candidates of this function.
    pub fn new(
        original: &'a FunctionDef,
        corpus: &'a [TestCase],
        sample: usize,
        check_deadline: Duration,
        budget: Duration,
    ) -> Self {
        let sample = sample.min(corpus.len());
        Self {
            original,
            corpus,
            sandbox: Sandbox::new(check_deadline),
            sample,
            budget,
            started: Instant::now(),
            original_outcomes: vec![None; sample],
            checked: 0,
            equivalent: 0,
            unverified: 0,
        }
    }

    /// True once the per-function budget has run out.
    pub fn budget_exhausted(&self) -> bool {
        self.started.elapsed() >= self.budget
    }

    /// Number of candidates actually checked.
    pub fn checked(&self) -> usize {
        self.checked
    }

    /// Number of candidates classified equivalent.
    pub fn equivalent(&self) -> usize {
        self.equivalent
    }

    /// Number of candidates accepted without verification.
    pub fn unverified(&self) -> usize {
        self.unverified
    }

    /// Classify a candidate, updating its status in place.
    ///
    /// With no corpus to sample, or once the budget is exhausted, the
    /// candidate is accepted as surviving and flagged unverified.
    pub fn classify(&mut self, mutant: &mut Mutant) -> EquivalenceStatus {
        if self.sample == 0 || self.budget_exhausted() {
            self.unverified += 1;
            mutant.equivalence = EquivalenceStatus::Surviving;
            mutant.equivalence_unverified = true;
            return mutant.equivalence;
        }

        for case_index in 0..self.sample {
            if self.budget_exhausted() {
                self.unverified += 1;
                mutant.equivalence = EquivalenceStatus::Surviving;
                mutant.equivalence_unverified = true;
                return mutant.equivalence;
            }
            let original_outcome = self.original_outcome(case_index);
            let mutant_outcome = self
                .sandbox
                .call(&mutant.func, &self.corpus[case_index].args);
            if !original_outcome.matches(&mutant_outcome) {
                self.checked += 1;
                mutant.equivalence = EquivalenceStatus::Surviving;
                return mutant.equivalence;
            }
        }

        self.checked += 1;
        self.equivalent += 1;
        debug!(mutant = %mutant.id, "classified equivalent, discarding");
        mutant.equivalence = EquivalenceStatus::Equivalent;
        mutant.equivalence
    }

    fn original_outcome(&mut self, case_index: usize) -> ExecutionOutcome {
        if self.original_outcomes[case_index].is_none() {
            self.original_outcomes[case_index] =
                Some(self.sandbox.call(self.original, &self.corpus[case_index].args));
        }
        self.original_outcomes[case_index]
            .clone()
            .unwrap_or(ExecutionOutcome::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use crate::lang::parse_function;
    use crate::mutation::mutant::{GenerationTier, RuleApplication};

    fn cases(pairs: &[(i64, i64)]) -> Vec<TestCase> {
        pairs
            .iter()
            .map(|(a, b)| TestCase::new(vec![Value::Int(*a), Value::Int(*b)]))
            .collect()
    }

    fn mutant_from(src: &str) -> Mutant {
        Mutant::new(
            "m-1",
            parse_function(src).unwrap(),
            GenerationTier::Standard,
            vec![RuleApplication::new("AOR", 0, "test")],
        )
    }

    fn filter<'a>(
        original: &'a FunctionDef,
        corpus: &'a [TestCase],
        budget: Duration,
    ) -> EquivalenceFilter<'a> {
        EquivalenceFilter::new(original, corpus, 10, Duration::from_millis(100), budget)
    }

    #[test]
    fn test_behaviorally_identical_mutant_is_equivalent() {
        let original = parse_function("fn f(a, b) { return a + b; }").unwrap();
        // `a + b + 0` agrees with the original everywhere.
        let mut mutant = mutant_from("fn f(a, b) { return a + b + 0; }");
        let corpus = cases(&[(1, 2), (0, 0), (-3, 7), (10, -10)]);
        let mut filter = filter(&original, &corpus, Duration::from_secs(5));

        let status = filter.classify(&mut mutant);
        assert_eq!(status, EquivalenceStatus::Equivalent);
        assert!(!mutant.equivalence_unverified);
        assert_eq!(filter.equivalent(), 1);
    }

    #[test]
    fn test_distinguishable_mutant_survives() {
        let original = parse_function("fn f(a, b) { return a + b; }").unwrap();
        let mut mutant = mutant_from("fn f(a, b) { return a - b; }");
        let corpus = cases(&[(2, 3)]);
        let mut filter = filter(&original, &corpus, Duration::from_secs(5));

        let status = filter.classify(&mut mutant);
        assert_eq!(status, EquivalenceStatus::Surviving);
        assert!(!mutant.equivalence_unverified);
    }

    #[test]
    fn test_same_raised_kind_counts_as_matching() {
        let original = parse_function("fn f(a, b) { return a / b; }").unwrap();
        // Also divides by b: same DivisionByZero on (1, 0).
        let mut mutant = mutant_from("fn f(a, b) { return a / b + 0; }");
        let corpus = cases(&[(1, 0)]);
        let mut filter = filter(&original, &corpus, Duration::from_secs(5));

        assert_eq!(filter.classify(&mut mutant), EquivalenceStatus::Equivalent);
    }

    #[test]
    fn test_budget_exhaustion_fails_open() {
        let original = parse_function("fn f(a, b) { return a + b; }").unwrap();
        let corpus = cases(&[(2, 3)]);
        // Zero budget: everything is accepted unverified.
        let mut filter = filter(&original, &corpus, Duration::ZERO);

        let mut mutant = mutant_from("fn f(a, b) { return a + b + 0; }");
        let status = filter.classify(&mut mutant);
        assert_eq!(status, EquivalenceStatus::Surviving);
        assert!(mutant.equivalence_unverified);
        assert_eq!(filter.unverified(), 1);
        assert_eq!(filter.checked(), 0);
    }

    #[test]
    fn test_empty_corpus_fails_open() {
        let original = parse_function("fn f(a, b) { return a + b; }").unwrap();
        let corpus: Vec<TestCase> = Vec::new();
        let mut filter = filter(&original, &corpus, Duration::from_secs(5));

        let mut mutant = mutant_from("fn f(a, b) { return a - b; }");
        assert_eq!(filter.classify(&mut mutant), EquivalenceStatus::Surviving);
        assert!(mutant.equivalence_unverified);
    }
}
