//! Import configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sluice_core::CompoundPlacement;

/// Settings for one structure import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Section header of structure definitions
    pub structure_section: String,
    /// Maximum chainage distance for joining an existing compound
    pub chainage_tolerance: f64,
    /// Prefix for generated compound names
    pub compound_prefix: String,
    /// Run the legacy property normalizer before parsing
    pub normalize_legacy: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            structure_section: "Structure".to_string(),
            chainage_tolerance: 0.01,
            compound_prefix: "CompositeBranchStructure".to_string(),
            normalize_legacy: true,
        }
    }
}

impl ImportConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing import configuration")
    }

    pub fn with_chainage_tolerance(mut self, tolerance: f64) -> Self {
        self.chainage_tolerance = tolerance;
        self
    }

    pub fn with_compound_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.compound_prefix = prefix.into();
        self
    }

    pub fn placement(&self) -> CompoundPlacement {
        CompoundPlacement::new(self.chainage_tolerance, self.compound_prefix.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ImportConfig::from_json(r#"{ "chainage_tolerance": 0.5 }"#).unwrap();
        assert_eq!(config.chainage_tolerance, 0.5);
        assert_eq!(config.structure_section, "Structure");
        assert!(config.normalize_legacy);
    }

    #[test]
    fn test_invalid_json_has_context() {
        let err = ImportConfig::from_json("{ nope").unwrap_err();
        assert!(err.to_string().contains("import configuration"));
    }

    #[test]
    fn test_placement_from_config() {
        let placement = ImportConfig::default()
            .with_compound_prefix("Compound")
            .with_chainage_tolerance(0.1)
            .placement();
        assert_eq!(placement.name_prefix, "Compound");
        assert_eq!(placement.tolerance, 0.1);
    }
}
