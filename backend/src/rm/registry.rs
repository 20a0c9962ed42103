//! Step registry
//!
//! Explicit registration table mapping a `step_type` tag to a builder
//! function. Populated with the built-in steps at startup; user steps
//! register before configuration validation. Duplicate tags are rejected,
//! so the mapping is unambiguous for the life of the process.

use crate::config::StepSpec;
use crate::error::ConfigError;
use crate::rm::{forecast::ForecastStep, optimization::OptimizationStep, untruncation::UntruncationStep, RmStep};
use std::collections::BTreeMap;

/// Builds a step instance from its configured spec.
pub type StepBuilder = fn(&StepSpec) -> Result<Box<dyn RmStep>, ConfigError>;

/// Registration table for RM step implementations.
///
/// # Example
///
/// ```
/// use rm_simulator_core_rs::rm::StepRegistry;
///
/// let registry = StepRegistry::with_builtins();
/// assert!(registry.known("forecast"));
/// assert!(!registry.known("made_up"));
/// ```
pub struct StepRegistry {
    builders: BTreeMap<String, StepBuilder>,
}

impl StepRegistry {
    /// An empty registry (no step types known).
    pub fn new() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// A registry pre-loaded with the built-in steps:
    /// `untruncation`, `forecast`, `optimization`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register("untruncation", UntruncationStep::from_spec)
            .expect("fresh registry has no duplicates");
        registry
            .register("forecast", ForecastStep::from_spec)
            .expect("fresh registry has no duplicates");
        registry
            .register("optimization", OptimizationStep::from_spec)
            .expect("fresh registry has no duplicates");
        registry
    }

    /// Register a builder under `tag`. Rejects duplicate tags.
    pub fn register(&mut self, tag: impl Into<String>, builder: StepBuilder) -> Result<(), ConfigError> {
        let tag = tag.into();
        if self.builders.contains_key(&tag) {
            return Err(ConfigError::DuplicateStepTag { tag });
        }
        self.builders.insert(tag, builder);
        Ok(())
    }

    pub fn known(&self, tag: &str) -> bool {
        self.builders.contains_key(tag)
    }

    /// Build a step instance from its spec.
    pub fn build(&self, spec: &StepSpec) -> Result<Box<dyn RmStep>, ConfigError> {
        let builder = self
            .builders
            .get(&spec.step_type)
            .ok_or_else(|| ConfigError::UnknownStepType {
                step_type: spec.step_type.clone(),
            })?;
        builder(spec)
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(step_type: &str) -> StepSpec {
        StepSpec {
            step_type: step_type.to_string(),
            name: String::new(),
            params: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_builtins_are_known() {
        let registry = StepRegistry::with_builtins();
        for tag in ["untruncation", "forecast", "optimization"] {
            assert!(registry.known(tag), "{} should be registered", tag);
        }
    }

    #[test]
    fn test_unknown_step_type_rejected() {
        let registry = StepRegistry::with_builtins();
        let err = registry.build(&spec("warp_drive")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownStepType { step_type } if step_type == "warp_drive"));
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let mut registry = StepRegistry::with_builtins();
        let err = registry
            .register("forecast", UntruncationStep::from_spec)
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateStepTag { tag } if tag == "forecast"));
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = StepRegistry::new();
        registry
            .register("untruncation", UntruncationStep::from_spec)
            .unwrap();
        let step = registry.build(&spec("untruncation")).unwrap();
        assert_eq!(step.step_type(), "untruncation");
    }
}
