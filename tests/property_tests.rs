use std::collections::HashSet;

use proptest::prelude::*;

use mutscore::core::{TestCase, Value};
use mutscore::lang::parse_function;
use mutscore::mutation::{default_registry, Engine, FunctionUnderTest, MutantGenerator};

// ---------------------------------------------------------------------------
// Generator property tests
// ---------------------------------------------------------------------------

/// Build a syntactically valid function body from fragments. Some bodies are
/// rich in mutation sites, some are deliberately barren, so both generation
/// modes (pure tiers and fallback duplication) get exercised.
fn body_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("let t = a + b;"),
            Just("let t = a * 2;"),
            Just("let t = a - 1;"),
            Just("if a < b { return b; }"),
            Just("if a == 0 { return 1; }"),
            Just("let t = a > 0 and b > 0;"),
            Just("let t = -a;"),
            Just("let t = not (a < b);"),
        ],
        0..6,
    )
    .prop_map(|fragments| {
        format!(
            "fn f(a, b) {{\n    {}\n    return a;\n}}",
            fragments.join("\n    ")
        )
    })
}

proptest! {
    /// The generator returns exactly K mutants whenever at least one genuine
    /// mutant exists; with duplication, duplicates are distinctly flagged
    /// and the count still lands on K.
    #[test]
    fn generator_returns_exactly_k(body in body_strategy(), k in 1usize..8) {
        let func = parse_function(&body).unwrap();
        let outcome = MutantGenerator::new(default_registry())
            .target_count(k)
            .seed(11)
            .generate(&func);

        if outcome.genuine > 0 {
            prop_assert_eq!(outcome.mutants.len(), k);
            let flagged = outcome.mutants.iter().filter(|m| m.flagged_duplicate).count();
            prop_assert_eq!(flagged, outcome.duplicated);
            prop_assert_eq!(outcome.genuine + outcome.duplicated, k);
        } else {
            prop_assert!(outcome.mutants.is_empty());
        }
    }

    /// No two non-duplicate mutants share a fingerprint, and none shares the
    /// original's.
    #[test]
    fn fingerprints_are_unique(body in body_strategy()) {
        let func = parse_function(&body).unwrap();
        let original_fp = func.fingerprint();
        let outcome = MutantGenerator::new(default_registry())
            .seed(11)
            .generate(&func);

        let mut seen = HashSet::new();
        for mutant in outcome.mutants.iter().filter(|m| !m.flagged_duplicate) {
            prop_assert_ne!(mutant.fingerprint, original_fp);
            prop_assert!(seen.insert(mutant.fingerprint), "fingerprint collision");
        }
    }

    /// Generation is deterministic for a fixed seed.
    #[test]
    fn generation_is_deterministic(body in body_strategy(), seed in any::<u64>()) {
        let func = parse_function(&body).unwrap();
        let first = MutantGenerator::new(default_registry()).seed(seed).generate(&func);
        let second = MutantGenerator::new(default_registry()).seed(seed).generate(&func);

        let fps1: Vec<u64> = first.mutants.iter().map(|m| m.fingerprint).collect();
        let fps2: Vec<u64> = second.mutants.iter().map(|m| m.fingerprint).collect();
        prop_assert_eq!(fps1, fps2);
    }

    /// Every generated mutant renders to source that reparses to the same
    /// fingerprint (mutants stay syntactically valid).
    #[test]
    fn mutants_are_syntactically_valid(body in body_strategy()) {
        let func = parse_function(&body).unwrap();
        let outcome = MutantGenerator::new(default_registry()).seed(11).generate(&func);

        for mutant in &outcome.mutants {
            let reparsed = parse_function(&mutant.source());
            prop_assert!(reparsed.is_ok(), "unparsable mutant: {}", mutant.source());
            prop_assert_eq!(reparsed.unwrap().fingerprint(), mutant.fingerprint);
        }
    }
}

// ---------------------------------------------------------------------------
// Engine property tests
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Kill rates always land in [0, 100].
    #[test]
    fn kill_rate_is_bounded(
        pairs in prop::collection::vec((-50i64..50, 1i64..50), 1..5),
        assertion in prop_oneof![
            Just("true"),
            Just("false"),
            Just("result == a + b"),
            Just("result >= a"),
            Just("result != none"),
        ],
    ) {
        let engine = Engine::new();
        let function = FunctionUnderTest::parse("f", "fn add(a, b) { return a + b; }").unwrap();
        let corpus: Vec<TestCase> = pairs
            .into_iter()
            .map(|(a, b)| TestCase::new(vec![Value::Int(a), Value::Int(b)]))
            .collect();

        let result = engine.evaluate_unit(&function, assertion, &corpus);
        if let Some(rate) = result.kill_rate {
            prop_assert!((0.0..=100.0).contains(&rate));
            prop_assert_eq!(result.generated, 5);
        }
    }
}
