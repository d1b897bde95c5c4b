//! Mutant types for the mutation engine.

use serde::{Deserialize, Serialize};

use crate::lang::FunctionDef;

/// Equivalence classification of a mutant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquivalenceStatus {
    /// Not yet checked.
    Unknown,
    /// Behaviorally indistinguishable from the original on the sampled
    /// inputs; excluded from scoring.
    Equivalent,
    /// Distinguishable on at least one sampled input (or assumed so after
    /// budget exhaustion).
    Surviving,
}

/// Which generation tier produced a mutant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationTier {
    /// Tier 1: standard rule tables.
    Standard,
    /// Tier 2: aggressive rule tables.
    Aggressive,
    /// Tier 3: two combined single-site rewrites.
    Compound,
    /// Tier 4: extra off-by-one/scaling edits to literal constants.
    ConstantVariation,
    /// Tier 5: a further operator applied to an accepted mutant.
    Padding,
    /// Tier 6: explicitly flagged duplicate of an accepted mutant.
    Duplicate,
}

/// One rule application recorded in a mutant's provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleApplication {
    /// Operator short name (e.g. "ROR").
    pub operator: String,
    /// Preorder site index the rewrite targeted.
    pub site: usize,
    /// Human-readable `original -> replacement` rendering.
    pub detail: String,
}

impl RuleApplication {
    /// Create a provenance record.
    pub fn new(operator: impl Into<String>, site: usize, detail: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            site,
            detail: detail.into(),
        }
    }
}

/// A single mutant: a rewritten copy-on-write tree plus provenance.
#[derive(Debug, Clone)]
pub struct Mutant {
    /// Unique identifier within one generation batch.
    pub id: String,
    /// The rewritten function; untouched subtrees are shared with the
    /// original.
    pub func: FunctionDef,
    /// Structural fingerprint used for deduplication.
    pub fingerprint: u64,
    /// Generation tier that produced this mutant.
    pub tier: GenerationTier,
    /// The rule application(s) that produced it, in order.
    pub rules: Vec<RuleApplication>,
    /// Equivalence classification.
    pub equivalence: EquivalenceStatus,
    /// True for fallback duplicates minted to reach the target count.
    pub flagged_duplicate: bool,
    /// True when the equivalence budget ran out before this mutant was
    /// checked and it was accepted as surviving by default.
    pub equivalence_unverified: bool,
}

impl Mutant {
    /// Create a mutant from a rewritten tree; computes the fingerprint.
    pub fn new(
        id: impl Into<String>,
        func: FunctionDef,
        tier: GenerationTier,
        rules: Vec<RuleApplication>,
    ) -> Self {
        let fingerprint = func.fingerprint();
        Self {
            id: id.into(),
            func,
            fingerprint,
            tier,
            rules,
            equivalence: EquivalenceStatus::Unknown,
            flagged_duplicate: false,
            equivalence_unverified: false,
        }
    }

    /// Mint an explicitly flagged duplicate of this mutant.
    pub fn duplicate(&self, id: impl Into<String>) -> Self {
        let mut dup = self.clone();
        dup.id = id.into();
        dup.tier = GenerationTier::Duplicate;
        dup.flagged_duplicate = true;
        dup
    }

    /// Render the mutant back to source text.
    pub fn source(&self) -> String {
        self.func.source()
    }

    /// Operator names in provenance order, joined for display.
    pub fn operator_label(&self) -> String {
        self.rules
            .iter()
            .map(|r| r.operator.as_str())
            .collect::<Vec<_>>()
            .join("+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parse_function;

    fn mutant() -> Mutant {
        let func = parse_function("fn f(a) { return a - 1; }").unwrap();
        Mutant::new(
            "f-1",
            func,
            GenerationTier::Standard,
            vec![RuleApplication::new("AOR", 0, "a + 1 -> a - 1")],
        )
    }

    #[test]
    fn test_mutant_new_computes_fingerprint() {
        let m = mutant();
        assert_eq!(m.fingerprint, m.func.fingerprint());
        assert_eq!(m.equivalence, EquivalenceStatus::Unknown);
        assert!(!m.flagged_duplicate);
        assert!(!m.equivalence_unverified);
    }

    #[test]
    fn test_duplicate_is_flagged() {
        let m = mutant();
        let dup = m.duplicate("f-2");
        assert_eq!(dup.id, "f-2");
        assert!(dup.flagged_duplicate);
        assert_eq!(dup.tier, GenerationTier::Duplicate);
        // Same tree, same fingerprint: distinguishable only by the flag.
        assert_eq!(dup.fingerprint, m.fingerprint);
    }

    #[test]
    fn test_operator_label_joins_rules() {
        let mut m = mutant();
        m.rules.push(RuleApplication::new("CRR", 2, "1 -> 2"));
        assert_eq!(m.operator_label(), "AOR+CRR");
    }

    #[test]
    fn test_tier_serialization() {
        assert_eq!(
            serde_json::to_string(&GenerationTier::ConstantVariation).unwrap(),
            "\"constant_variation\""
        );
        assert_eq!(
            serde_json::to_string(&EquivalenceStatus::Surviving).unwrap(),
            "\"surviving\""
        );
    }
}
