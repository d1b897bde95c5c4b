//! Tiered mutant generation.
//!
//! The generator walks an ordered sequence of tiers and halts as soon as the
//! target count of unique, non-equivalent mutants is reached:
//!
//! 1. Standard rule tables at every matching site.
//! 2. Aggressive rule tables at the same sites.
//! 3. Compound: two non-overlapping single-site rewrites, bounded attempts.
//! 4. Constant variation: extra off-by-one/scaling edits to int literals.
//! 5. Padding: a further operator applied to an already-accepted mutant.
//! 6. Fallback duplication: explicitly flagged copies up to the target.
//!
//! Candidates are deduplicated by structural fingerprint, and no candidate
//! may share the original's fingerprint. Tiers 3+ draw from a seeded RNG, so
//! a fixed seed reproduces the batch exactly.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::lang::{expr_rewrites, Expr, FunctionDef, Rewrite};

use super::equivalence::EquivalenceFilter;
use super::mutant::{EquivalenceStatus, GenerationTier, Mutant, RuleApplication};
use super::operator::{OperatorRegistry, RuleVariant};

/// Extra integer edits applied by the constant-variation tier, beyond the
/// `n + 1` / `n * 2` coverage of tiers 1-2.
const CONSTANT_DELTAS: [i64; 4] = [-1, 2, -2, 3];
const CONSTANT_SCALES: [i64; 2] = [3, -1];

/// Result of one generation run.
#[derive(Debug)]
pub struct GenerationOutcome {
    /// Exactly the target count of mutants, unless no genuine mutant could
    /// be produced at all (then empty).
    pub mutants: Vec<Mutant>,
    /// Count of genuine (non-duplicate) mutants.
    pub genuine: usize,
    /// Count of flagged fallback duplicates.
    pub duplicated: usize,
    /// Candidates discarded as behaviorally equivalent.
    pub equivalent_discarded: usize,
    /// True when the tier budget ran out and duplication was used.
    pub exhausted: bool,
}

/// Generator producing a fixed-size batch of mutants for one function.
pub struct MutantGenerator {
    registry: OperatorRegistry,
    target: usize,
    compound_attempts: usize,
    seed: u64,
}

impl MutantGenerator {
    /// Create a generator over the given operator registry.
    pub fn new(registry: OperatorRegistry) -> Self {
        Self {
            registry,
            target: 5,
            compound_attempts: 20,
            seed: 0,
        }
    }

    /// Set the target batch size.
    pub fn target_count(mut self, target: usize) -> Self {
        self.target = target;
        self
    }

    /// Set the attempt bound for the compound tier.
    pub fn compound_attempts(mut self, attempts: usize) -> Self {
        self.compound_attempts = attempts;
        self
    }

    /// Set the RNG seed used by tiers 3+.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generate a batch without equivalence filtering (dry run); statuses
    /// stay `Unknown`.
    pub fn generate(&self, func: &FunctionDef) -> GenerationOutcome {
        self.run(func, &mut |_| true)
    }

    /// Generate a batch, discarding candidates the filter classifies as
    /// equivalent so the returned batch contains only survivors.
    pub fn generate_filtered(
        &self,
        func: &FunctionDef,
        filter: &mut EquivalenceFilter<'_>,
    ) -> GenerationOutcome {
        self.run(func, &mut |mutant| {
            filter.classify(mutant) != EquivalenceStatus::Equivalent
        })
    }

    fn run(&self, func: &FunctionDef, check: &mut dyn FnMut(&mut Mutant) -> bool) -> GenerationOutcome {
        let mut state = GenState {
            prefix: func.name.to_string(),
            target: self.target,
            seen: HashSet::from([func.fingerprint()]),
            accepted: Vec::new(),
            equivalent_discarded: 0,
            next_id: 0,
        };

        // Tier 1: standard tables.
        self.enumeration_tier(func, RuleVariant::Standard, GenerationTier::Standard, &mut state, check);
        // Tier 2: aggressive tables.
        self.enumeration_tier(func, RuleVariant::Aggressive, GenerationTier::Aggressive, &mut state, check);
        // Tier 3: compound rewrites.
        self.compound_tier(&mut state, check);
        // Tier 4: constant variation.
        self.constant_variation_tier(func, &mut state, check);
        // Tier 5: padding.
        self.padding_tier(&mut state, check);

        let genuine = state.accepted.len();
        // Tier 6: fallback duplication up to the target.
        let mut duplicated = 0;
        if genuine > 0 && genuine < state.target {
            warn!(
                function = %func.name,
                genuine,
                target = state.target,
                "generation exhausted, padding with flagged duplicates"
            );
            let mut i = 0;
            while state.accepted.len() < state.target {
                state.next_id += 1;
                let dup = state.accepted[i % genuine]
                    .duplicate(format!("{}-{}", state.prefix, state.next_id));
                state.accepted.push(dup);
                duplicated += 1;
                i += 1;
            }
        }

        if genuine == 0 {
            debug!(function = %func.name, "no genuine mutants could be produced");
        }

        GenerationOutcome {
            mutants: state.accepted,
            genuine,
            duplicated,
            equivalent_discarded: state.equivalent_discarded,
            exhausted: duplicated > 0,
        }
    }

    fn enumeration_tier(
        &self,
        func: &FunctionDef,
        variant: RuleVariant,
        tier: GenerationTier,
        state: &mut GenState,
        check: &mut dyn FnMut(&mut Mutant) -> bool,
    ) {
        for op in self.registry.operators() {
            if state.full() {
                return;
            }
            for rewrite in op.mutations(func, variant) {
                if state.full() {
                    return;
                }
                let rules = vec![RuleApplication::new(op.name(), rewrite.site, rewrite.detail.clone())];
                state.offer(rewrite.func, tier, rules, check);
            }
        }
    }

    fn compound_tier(&self, state: &mut GenState, check: &mut dyn FnMut(&mut Mutant) -> bool) {
        if state.full() {
            return;
        }
        let bases: Vec<Mutant> = state
            .accepted
            .iter()
            .filter(|m| {
                matches!(
                    m.tier,
                    GenerationTier::Standard | GenerationTier::Aggressive
                )
            })
            .cloned()
            .collect();
        if bases.is_empty() || self.registry.operators().is_empty() {
            return;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        for _ in 0..self.compound_attempts {
            if state.full() {
                return;
            }
            let base = &bases[rng.gen_range(0..bases.len())];
            let ops = self.registry.operators();
            let op = &ops[rng.gen_range(0..ops.len())];
            let variant = if rng.gen_bool(0.5) {
                RuleVariant::Standard
            } else {
                RuleVariant::Aggressive
            };
            let base_sites: Vec<usize> = base.rules.iter().map(|r| r.site).collect();
            let candidates: Vec<Rewrite> = op
                .mutations(&base.func, variant)
                .into_iter()
                .filter(|rw| !base_sites.contains(&rw.site))
                .collect();
            if candidates.is_empty() {
                continue;
            }
            let rewrite = &candidates[rng.gen_range(0..candidates.len())];
            let mut rules = base.rules.clone();
            rules.push(RuleApplication::new(
                op.name(),
                rewrite.site,
                rewrite.detail.clone(),
            ));
            state.offer(rewrite.func.clone(), GenerationTier::Compound, rules, check);
        }
    }

    fn constant_variation_tier(
        &self,
        func: &FunctionDef,
        state: &mut GenState,
        check: &mut dyn FnMut(&mut Mutant) -> bool,
    ) {
        if state.full() {
            return;
        }
        let rewrites = expr_rewrites(func, |e| match e {
            Expr::Int(n) => {
                let mut edits = Vec::new();
                for delta in CONSTANT_DELTAS {
                    if let Some(v) = n.checked_add(delta) {
                        edits.push(Expr::Int(v));
                    }
                }
                for scale in CONSTANT_SCALES {
                    if let Some(v) = n.checked_mul(scale) {
                        edits.push(Expr::Int(v));
                    }
                }
                edits
            }
            _ => vec![],
        });
        for rewrite in rewrites {
            if state.full() {
                return;
            }
            let rules = vec![RuleApplication::new("CRR", rewrite.site, rewrite.detail.clone())];
            state.offer(rewrite.func, GenerationTier::ConstantVariation, rules, check);
        }
    }

    fn padding_tier(&self, state: &mut GenState, check: &mut dyn FnMut(&mut Mutant) -> bool) {
        if state.full() {
            return;
        }
        let bases: Vec<Mutant> = state.accepted.clone();
        for base in &bases {
            for op in self.registry.operators() {
                if state.full() {
                    return;
                }
                for rewrite in op.mutations(&base.func, RuleVariant::Standard) {
                    if state.full() {
                        return;
                    }
                    let mut rules = base.rules.clone();
                    rules.push(RuleApplication::new(
                        op.name(),
                        rewrite.site,
                        rewrite.detail.clone(),
                    ));
                    state.offer(rewrite.func, GenerationTier::Padding, rules, check);
                }
            }
        }
    }
}

struct GenState {
    prefix: String,
    target: usize,
    seen: HashSet<u64>,
    accepted: Vec<Mutant>,
    equivalent_discarded: usize,
    next_id: usize,
}

impl GenState {
    fn full(&self) -> bool {
        self.accepted.len() >= self.target
    }

    /// Offer a candidate: dedupe by fingerprint, run the equivalence check,
    /// and accept it if it survives.
    fn offer(
        &mut self,
        func: FunctionDef,
        tier: GenerationTier,
        rules: Vec<RuleApplication>,
        check: &mut dyn FnMut(&mut Mutant) -> bool,
    ) {
        if self.full() {
            return;
        }
        let fingerprint = func.fingerprint();
        if !self.seen.insert(fingerprint) {
            return;
        }
        self.next_id += 1;
        let id = format!("{}-{}", self.prefix, self.next_id);
        let mut mutant = Mutant::new(id, func, tier, rules);
        if check(&mut mutant) {
            self.accepted.push(mutant);
        } else {
            self.equivalent_discarded += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parse_function;
    use crate::mutation::operators::{default_registry, RelationalOperator};
    use crate::mutation::operator::OperatorRegistry;

    fn generator() -> MutantGenerator {
        MutantGenerator::new(default_registry()).seed(7)
    }

    #[test]
    fn test_exactly_k_mutants_for_rich_function() {
        let func = parse_function(
            "fn clamp(x, lo, hi) { if x < lo { return lo; } if x > hi { return hi; } return x; }",
        )
        .unwrap();
        let outcome = generator().generate(&func);
        assert_eq!(outcome.mutants.len(), 5);
        assert_eq!(outcome.genuine, 5);
        assert_eq!(outcome.duplicated, 0);
        assert!(!outcome.exhausted);
    }

    #[test]
    fn test_fingerprints_unique_and_distinct_from_original() {
        let func = parse_function(
            "fn poly(a, b) { return a * a + 2 * a * b + b * b; }",
        )
        .unwrap();
        let original_fp = func.fingerprint();
        let outcome = generator().generate(&func);

        let mut fps = HashSet::new();
        for m in outcome.mutants.iter().filter(|m| !m.flagged_duplicate) {
            assert_ne!(m.fingerprint, original_fp);
            assert!(fps.insert(m.fingerprint), "duplicate fingerprint");
        }
    }

    #[test]
    fn test_function_without_comparisons_still_reaches_k() {
        // No relational site at all; the remaining tiers must fill the batch
        // without erroring.
        let func = parse_function("fn add(a, b) { return a + b; }").unwrap();
        let outcome = generator().generate(&func);
        assert_eq!(outcome.mutants.len(), 5);
    }

    #[test]
    fn test_duplicates_are_flagged_when_exhausted() {
        // A single-operator registry over a single comparison (and no int
        // literals for the constant-variation tier) can only ever produce
        // three distinct trees, so two flagged duplicates fill the batch.
        let mut registry = OperatorRegistry::new();
        registry.register(Box::new(RelationalOperator));
        let generator = MutantGenerator::new(registry).seed(7);

        let func = parse_function("fn pos(a, b) { return a > b; }").unwrap();
        let outcome = generator.generate(&func);

        assert_eq!(outcome.mutants.len(), 5);
        assert_eq!(outcome.genuine, 3);
        assert_eq!(outcome.duplicated, 2);
        assert!(outcome.exhausted);
        let flagged = outcome.mutants.iter().filter(|m| m.flagged_duplicate).count();
        assert_eq!(flagged, 2);
        for m in outcome.mutants.iter().filter(|m| m.flagged_duplicate) {
            assert_eq!(m.tier, GenerationTier::Duplicate);
        }
    }

    #[test]
    fn test_no_sites_at_all_yields_empty_outcome() {
        let func = parse_function("fn nop() { return; }").unwrap();
        let outcome = generator().generate(&func);
        assert!(outcome.mutants.is_empty());
        assert_eq!(outcome.genuine, 0);
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let func = parse_function(
            "fn f(a, b) { if a > b { return a - b; } return b - a; }",
        )
        .unwrap();
        let first = MutantGenerator::new(default_registry()).seed(99).generate(&func);
        let second = MutantGenerator::new(default_registry()).seed(99).generate(&func);
        let fps1: Vec<u64> = first.mutants.iter().map(|m| m.fingerprint).collect();
        let fps2: Vec<u64> = second.mutants.iter().map(|m| m.fingerprint).collect();
        assert_eq!(fps1, fps2);
    }

    #[test]
    fn test_compound_mutants_record_both_rules() {
        // Force the generator past tiers 1-2 by asking for a large batch.
        let func = parse_function("fn f(a, b) { return a + b; }").unwrap();
        let outcome = MutantGenerator::new(default_registry())
            .seed(3)
            .target_count(8)
            .generate(&func);
        if let Some(compound) = outcome
            .mutants
            .iter()
            .find(|m| m.tier == GenerationTier::Compound)
        {
            assert!(compound.rules.len() >= 2);
        }
    }
}
