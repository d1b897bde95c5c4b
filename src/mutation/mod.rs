//! Mutation-based assertion completeness engine.
//!
//! For each (function, strategy) unit the engine generates a fixed-size
//! batch of mutants, discards the ones behaviorally indistinguishable from
//! the original, runs the strategy's assertion against each survivor in the
//! sandbox, and reports the fraction killed. Units are independent (each
//! works on its own tree and sandbox state), so a batch fans out across
//! rayon workers.

mod equivalence;
mod evaluator;
mod generator;
mod mutant;
mod operator;
pub mod operators;

pub use equivalence::EquivalenceFilter;
pub use evaluator::{CaseRecord, EvaluationSummary, KillRateEvaluator, KillRecord};
pub use generator::{GenerationOutcome, MutantGenerator};
pub use mutant::{EquivalenceStatus, GenerationTier, Mutant, RuleApplication};
pub use operator::{Category, MutationOperator, OperatorRegistry, RuleVariant};
pub use operators::default_registry;

use std::collections::BTreeMap;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::core::{Error, Result, TestCase};
use crate::lang::{parse_assertion, parse_function, FunctionDef};
use crate::report::CompletenessReport;
use crate::sandbox::Sandbox;

/// A function loaded for one evaluation run. Immutable after parsing.
#[derive(Debug, Clone)]
pub struct FunctionUnderTest {
    /// External identifier (e.g. a dataset task id).
    pub id: String,
    /// Original source text.
    pub source: String,
    /// Parsed definition.
    pub def: FunctionDef,
}

impl FunctionUnderTest {
    /// Parse a function's source. A parse failure is fatal for this function
    /// only; the caller records a null result and moves on.
    pub fn parse(id: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let source = source.into();
        let def = parse_function(&source).map_err(|e| match e {
            Error::Parse { message, .. } => Error::Parse {
                unit: id.clone(),
                message,
            },
            other => other,
        })?;
        Ok(Self { id, source, def })
    }

    /// Function name from the parsed definition.
    pub fn name(&self) -> &str {
        &self.def.name
    }
}

/// One batch entry: a function, its per-strategy assertions, and its corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    /// Function identifier used as the report key.
    pub function_id: String,
    /// Function source text.
    pub source: String,
    /// Assertion source per strategy name.
    pub assertions: BTreeMap<String, String>,
    /// Argument tuples for this function.
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

/// Detailed result for one (function, strategy) unit.
#[derive(Debug, Clone)]
pub struct UnitResult {
    /// Kill rate in `[0, 100]`, or `None` when the unit could not be scored.
    pub kill_rate: Option<f64>,
    /// Mutants handed to the evaluator.
    pub generated: usize,
    /// Genuine (non-duplicate) mutants among them.
    pub genuine: usize,
    /// Flagged fallback duplicates among them.
    pub duplicated: usize,
    /// Candidates discarded as equivalent during generation.
    pub equivalent_discarded: usize,
    /// Survivors accepted without an equivalence check (budget ran out).
    pub unverified: usize,
    /// Killed mutants.
    pub killed: usize,
    /// Per-mutant kill records.
    pub records: Vec<KillRecord>,
    /// Wall-clock duration of the unit, in ms.
    pub duration_ms: u64,
}

impl UnitResult {
    fn null(duration_ms: u64) -> Self {
        Self {
            kill_rate: None,
            generated: 0,
            genuine: 0,
            duplicated: 0,
            equivalent_discarded: 0,
            unverified: 0,
            killed: 0,
            records: Vec::new(),
            duration_ms,
        }
    }
}

/// One generated mutant rendered for listing (dry runs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutantListing {
    /// Mutant identifier.
    pub id: String,
    /// Operator name(s) in provenance order.
    pub operator: String,
    /// Generation tier.
    pub tier: GenerationTier,
    /// Rewrite description(s).
    pub detail: String,
    /// True for fallback duplicates.
    pub flagged_duplicate: bool,
    /// Rendered mutant source.
    pub source: String,
}

/// The mutation engine, configured once and reused across a batch.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Engine with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with an explicit configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn generator(&self) -> MutantGenerator {
        MutantGenerator::new(default_registry())
            .target_count(self.config.mutants_per_function)
            .compound_attempts(self.config.compound_attempts)
            .seed(self.config.seed)
    }

    fn sandbox(&self) -> Sandbox {
        Sandbox::new(self.config.call_deadline()).max_depth(self.config.max_recursion_depth)
    }

    /// Generate and equivalence-filter the mutant batch for one function.
    pub fn prepare(&self, function: &FunctionUnderTest, corpus: &[TestCase]) -> GenerationOutcome {
        let mut filter = EquivalenceFilter::new(
            &function.def,
            corpus,
            self.config.equivalence_sample,
            self.config.check_deadline(),
            self.config.equivalence_budget(),
        );
        let outcome = self.generator().generate_filtered(&function.def, &mut filter);
        debug!(
            function = %function.id,
            generated = outcome.mutants.len(),
            genuine = outcome.genuine,
            equivalent = outcome.equivalent_discarded,
            unverified = filter.unverified(),
            "mutant batch prepared"
        );
        outcome
    }

    /// Evaluate one (function, strategy) unit end to end.
    pub fn evaluate_unit(
        &self,
        function: &FunctionUnderTest,
        assertion_source: &str,
        corpus: &[TestCase],
    ) -> UnitResult {
        let start = Instant::now();
        if corpus.is_empty() {
            warn!(function = %function.id, "no test cases, recording null result");
            return UnitResult::null(elapsed_ms(start));
        }
        let generation = self.prepare(function, corpus);
        self.score(function, &generation, assertion_source, corpus, start)
    }

    /// Score one strategy's assertion against an already-prepared batch.
    fn score(
        &self,
        function: &FunctionUnderTest,
        generation: &GenerationOutcome,
        assertion_source: &str,
        corpus: &[TestCase],
        start: Instant,
    ) -> UnitResult {
        if generation.genuine == 0 {
            warn!(function = %function.id, "no mutants could be generated, recording null result");
            return UnitResult::null(elapsed_ms(start));
        }
        let assertion = match parse_assertion(assertion_source) {
            Ok(expr) => expr,
            Err(e) => {
                warn!(function = %function.id, error = %e, "assertion failed to parse, recording null result");
                return UnitResult::null(elapsed_ms(start));
            }
        };

        let evaluator = KillRateEvaluator::new(self.config.evaluation_sample);
        let summary = evaluator.evaluate(&generation.mutants, &assertion, corpus, &self.sandbox());
        let unverified = generation
            .mutants
            .iter()
            .filter(|m| m.equivalence_unverified)
            .count();

        UnitResult {
            kill_rate: Some(summary.kill_rate),
            generated: generation.mutants.len(),
            genuine: generation.genuine,
            duplicated: generation.duplicated,
            equivalent_discarded: generation.equivalent_discarded,
            unverified,
            killed: summary.killed,
            records: summary.records,
            duration_ms: elapsed_ms(start),
        }
    }

    /// Evaluate a whole batch, one unit per (function, strategy) pair.
    ///
    /// Units run on parallel workers. With `reuse_existing` set, pairs
    /// already present in `previous` are copied over instead of recomputed.
    /// Reuse is a pure configuration decision, never a prompt.
    pub fn evaluate_batch(
        &self,
        items: &[BatchItem],
        previous: Option<&CompletenessReport>,
    ) -> CompletenessReport {
        let start = Instant::now();
        let per_function: Vec<(String, BTreeMap<String, Option<f64>>)> = items
            .par_iter()
            .map(|item| (item.function_id.clone(), self.evaluate_item(item, previous)))
            .collect();

        let mut report = CompletenessReport::new();
        for (function_id, strategies) in per_function {
            for (strategy, kill_rate) in strategies {
                report.insert(function_id.clone(), strategy, kill_rate);
            }
        }
        info!(
            functions = items.len(),
            duration_ms = elapsed_ms(start),
            "batch evaluation complete"
        );
        report
    }

    fn evaluate_item(
        &self,
        item: &BatchItem,
        previous: Option<&CompletenessReport>,
    ) -> BTreeMap<String, Option<f64>> {
        let mut results: BTreeMap<String, Option<f64>> = BTreeMap::new();

        // Copy over reusable entries first; only missing pairs cost work.
        let mut pending: Vec<(&String, &String)> = Vec::new();
        for (strategy, assertion) in &item.assertions {
            match previous.filter(|_| self.config.reuse_existing).and_then(|p| {
                p.get(&item.function_id, strategy)
            }) {
                Some(entry) => {
                    debug!(function = %item.function_id, strategy = %strategy, "reusing existing entry");
                    results.insert(strategy.clone(), entry);
                }
                None => pending.push((strategy, assertion)),
            }
        }
        if pending.is_empty() {
            return results;
        }

        let function = match FunctionUnderTest::parse(&item.function_id, &item.source) {
            Ok(f) => f,
            Err(e) => {
                warn!(function = %item.function_id, error = %e, "parse failure, recording null results");
                for (strategy, _) in pending {
                    results.insert(strategy.clone(), None);
                }
                return results;
            }
        };

        if item.test_cases.is_empty() {
            warn!(function = %item.function_id, "no test cases, recording null results");
            for (strategy, _) in pending {
                results.insert(strategy.clone(), None);
            }
            return results;
        }

        // One generation run per function; every strategy scores against the
        // same batch, mirroring the per-function budgets.
        let generation = self.prepare(&function, &item.test_cases);
        for (strategy, assertion) in pending {
            let start = Instant::now();
            let unit = self.score(&function, &generation, assertion, &item.test_cases, start);
            results.insert(strategy.clone(), unit.kill_rate);
        }
        results
    }

    /// Parse a source text and list its generated mutant batch without any
    /// execution (dry run).
    pub fn list_mutants(&self, source: &str) -> Result<Vec<MutantListing>> {
        let def = parse_function(source)?;
        let outcome = self.generator().generate(&def);
        Ok(outcome
            .mutants
            .into_iter()
            .map(|m| MutantListing {
                id: m.id.clone(),
                operator: m.operator_label(),
                tier: m.tier,
                detail: m
                    .rules
                    .iter()
                    .map(|r| r.detail.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
                flagged_duplicate: m.flagged_duplicate,
                source: m.source(),
            })
            .collect())
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    fn add_item() -> BatchItem {
        BatchItem {
            function_id: "1".into(),
            source: "fn add(a, b) { return a + b; }".into(),
            assertions: BTreeMap::from([
                ("exact".to_string(), "result == a + b".to_string()),
                ("weak".to_string(), "true".to_string()),
            ]),
            test_cases: vec![
                TestCase::new(vec![Value::Int(2), Value::Int(3)]),
                TestCase::new(vec![Value::Int(-1), Value::Int(4)]),
                TestCase::new(vec![Value::Int(0), Value::Int(0)]),
            ],
        }
    }

    #[test]
    fn test_evaluate_unit_exact_assertion_scores_high() {
        let engine = Engine::new();
        let function = FunctionUnderTest::parse("1", "fn add(a, b) { return a + b; }").unwrap();
        let corpus = add_item().test_cases;

        let result = engine.evaluate_unit(&function, "result == a + b", &corpus);
        let rate = result.kill_rate.expect("unit should score");
        assert!(rate > 0.0);
        assert_eq!(result.generated, 5);
        assert_eq!(result.records.len(), 5);
    }

    #[test]
    fn test_evaluate_unit_tautology_scores_zero_ish() {
        let engine = Engine::new();
        let function = FunctionUnderTest::parse("1", "fn add(a, b) { return a + b; }").unwrap();
        let corpus = add_item().test_cases;

        let result = engine.evaluate_unit(&function, "true", &corpus);
        // Only mutants that crash on the sampled inputs can count as killed
        // under a tautological assertion.
        let rate = result.kill_rate.expect("unit should score");
        assert!(rate < 100.0);
    }

    #[test]
    fn test_unparsable_function_is_null_and_batch_continues() {
        let engine = Engine::new();
        let mut bad = add_item();
        bad.function_id = "2".into();
        bad.source = "fn broken( {".into();
        let items = vec![add_item(), bad];

        let report = engine.evaluate_batch(&items, None);
        assert_eq!(report.get("2", "exact"), Some(None));
        assert!(report.get("1", "exact").unwrap().is_some());
    }

    #[test]
    fn test_empty_corpus_is_null() {
        let engine = Engine::new();
        let mut item = add_item();
        item.test_cases.clear();
        let report = engine.evaluate_batch(&[item], None);
        assert_eq!(report.get("1", "exact"), Some(None));
    }

    #[test]
    fn test_unparsable_assertion_nulls_that_strategy_only() {
        let engine = Engine::new();
        let mut item = add_item();
        item.assertions
            .insert("broken".to_string(), "result == ==".to_string());
        let report = engine.evaluate_batch(&[item], None);
        assert_eq!(report.get("1", "broken"), Some(None));
        assert!(report.get("1", "exact").unwrap().is_some());
    }

    #[test]
    fn test_reuse_existing_copies_previous_entries() {
        let config = EngineConfig {
            reuse_existing: true,
            ..EngineConfig::default()
        };
        let engine = Engine::with_config(config);

        let mut previous = CompletenessReport::new();
        previous.insert("1", "exact", Some(12.0));

        let report = engine.evaluate_batch(&[add_item()], Some(&previous));
        // The reused value is carried verbatim, the missing one is computed.
        assert_eq!(report.get("1", "exact"), Some(Some(12.0)));
        assert!(report.get("1", "weak").is_some());
    }

    #[test]
    fn test_without_reuse_previous_is_ignored() {
        let engine = Engine::new();
        let mut previous = CompletenessReport::new();
        previous.insert("1", "exact", Some(12.0));

        let report = engine.evaluate_batch(&[add_item()], Some(&previous));
        assert_ne!(report.get("1", "exact"), Some(Some(12.0)));
    }

    #[test]
    fn test_list_mutants_dry_run() {
        let engine = Engine::new();
        let listings = engine
            .list_mutants("fn add(a, b) { return a + b; }")
            .unwrap();
        assert_eq!(listings.len(), 5);
        assert!(listings.iter().any(|l| l.source.contains("a - b")));
        assert!(listings.iter().all(|l| !l.operator.is_empty()));
    }

    #[test]
    fn test_function_under_test_parse_error_names_unit() {
        let err = FunctionUnderTest::parse("task-9", "fn broken(").unwrap_err();
        assert!(err.to_string().contains("task-9"));
    }
}
