//! Configuration loading and management.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Engine configuration.
///
/// Every field has a default, so a partial TOML file (or none at all) is
/// valid. Budgets are expressed in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of mutants handed to the evaluator per function (K).
    pub mutants_per_function: usize,
    /// RNG seed for generation tiers 3+.
    pub seed: u64,
    /// Attempt bound for the compound generation tier.
    pub compound_attempts: usize,
    /// Test cases sampled per equivalence check.
    pub equivalence_sample: usize,
    /// Test cases sampled per kill-rate evaluation.
    pub evaluation_sample: usize,
    /// Deadline for one sandboxed call during evaluation, in ms.
    pub call_deadline_ms: u64,
    /// Deadline for one side of an equivalence check, in ms.
    pub check_deadline_ms: u64,
    /// Whole-function equivalence budget, in ms.
    pub equivalence_budget_ms: u64,
    /// Cap on self-recursion depth inside the sandbox.
    pub max_recursion_depth: usize,
    /// Reuse entries from an existing report instead of recomputing them.
    pub reuse_existing: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mutants_per_function: 5,
            seed: 0x00C0_FFEE,
            compound_attempts: 20,
            equivalence_sample: 10,
            evaluation_sample: 100,
            call_deadline_ms: 100,
            check_deadline_ms: 50,
            equivalence_budget_ms: 2000,
            max_recursion_depth: 64,
            reuse_existing: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from an explicit TOML file path.
    ///
    /// Errors if the file does not exist; use this for explicit `--config`
    /// flags.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        Ok(config)
    }

    /// Load configuration from a directory, looking for `mutscore.toml`.
    /// A missing file is silently skipped (defaults are used).
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join("mutscore.toml");
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Render the default configuration as a TOML document.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Per-call deadline for evaluation-phase sandboxing.
    pub fn call_deadline(&self) -> Duration {
        Duration::from_millis(self.call_deadline_ms)
    }

    /// Per-call deadline for equivalence checks.
    pub fn check_deadline(&self) -> Duration {
        Duration::from_millis(self.check_deadline_ms)
    }

    /// Whole-function equivalence budget.
    pub fn equivalence_budget(&self) -> Duration {
        Duration::from_millis(self.equivalence_budget_ms)
    }
}
