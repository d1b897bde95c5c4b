//! Completeness report persistence.
//!
//! The persisted shape is a mapping from function identifier to a mapping
//! from strategy name to a kill rate in `[0, 100]`, with `null` for units
//! where generation or parsing failed. Downstream reporting consumes this
//! file as-is.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::Result;

/// Kill rates per (function, strategy) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletenessReport {
    #[serde(flatten)]
    entries: BTreeMap<String, BTreeMap<String, Option<f64>>>,
}

impl CompletenessReport {
    /// Empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a kill rate (or `None` for a failed unit).
    pub fn insert(
        &mut self,
        function_id: impl Into<String>,
        strategy: impl Into<String>,
        kill_rate: Option<f64>,
    ) {
        self.entries
            .entry(function_id.into())
            .or_default()
            .insert(strategy.into(), kill_rate);
    }

    /// Look up an entry. Outer `None` means the pair was never recorded.
    pub fn get(&self, function_id: &str, strategy: &str) -> Option<Option<f64>> {
        self.entries
            .get(function_id)
            .and_then(|per_strategy| per_strategy.get(strategy))
            .copied()
    }

    /// True when the pair has a recorded entry (even a null one).
    pub fn contains(&self, function_id: &str, strategy: &str) -> bool {
        self.get(function_id, strategy).is_some()
    }

    /// All entries, keyed by function id.
    pub fn entries(&self) -> &BTreeMap<String, BTreeMap<String, Option<f64>>> {
        &self.entries
    }

    /// Number of functions with at least one entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a report from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the report to a JSON file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
