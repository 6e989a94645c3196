//! # Generation Module
//!
//! Encounter generation: template resolution, budget matching and the engine that
//! ties them together.
//!
//! Every generator takes its randomness from a caller-supplied `StdRng`, so a
//! seeded generator reproduces the same encounter for the same inputs.

pub mod encounters;
pub mod expression;
pub mod matcher;
pub mod templates;

pub use encounters::*;
pub use expression::*;
pub use matcher::*;
pub use templates::*;

use crate::config::BUDGET_FACTOR;
use crate::{EncounterError, EncounterResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration for encounter generation.
///
/// Holds the budget correction factor and the registry of named template modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Multiplier applied to the difficulty threshold to form the experience budget
    pub budget_factor: f64,
    /// Template modes by name
    pub modes: BTreeMap<String, EncounterMode>,
}

impl GenerationConfig {
    /// Creates a configuration with the built-in template modes.
    ///
    /// # Examples
    ///
    /// ```
    /// use encounterforge::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(42);
    /// assert!(config.mode("random").is_ok());
    /// assert!((config.budget_factor - 1.1).abs() < f64::EPSILON);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            budget_factor: BUDGET_FACTOR,
            modes: builtin_modes(),
        }
    }

    /// Creates a configuration whose modes each have a single fixed-count sample.
    pub fn for_testing(seed: u64) -> Self {
        let mut modes = BTreeMap::new();
        modes.insert(
            "random".to_string(),
            EncounterMode::new(
                "Random",
                vec![TemplateSample::Counts(vec![
                    GroupCount::Fixed(1),
                    GroupCount::Fixed(1),
                    GroupCount::Fixed(2),
                ])],
            ),
        );
        modes.insert(
            "boss_minions".to_string(),
            EncounterMode::new(
                "Boss and minions",
                vec![TemplateSample::Spec(TemplateSpec {
                    groups: vec![GroupSpec::fixed(1, Some(3.0)), GroupSpec::fixed(3, Some(1.0))],
                    subtractive: false,
                })],
            ),
        );

        Self {
            seed,
            budget_factor: BUDGET_FACTOR,
            modes,
        }
    }

    /// Looks up a template mode by name.
    pub fn mode(&self, name: &str) -> EncounterResult<&EncounterMode> {
        self.modes
            .get(name)
            .ok_or_else(|| EncounterError::UnknownMode(name.to_string()))
    }

    /// Adds the modes from a JSON object of `name -> mode`, replacing same-named modes.
    pub fn merge_modes_json(&mut self, json: &str) -> EncounterResult<()> {
        let extra: BTreeMap<String, EncounterMode> = serde_json::from_str(json)?;
        for (name, mode) in extra {
            if mode.samples.is_empty() {
                return Err(EncounterError::InvalidTemplate(format!(
                    "mode '{}' has no samples",
                    name
                )));
            }
            log::debug!("Registering template mode {}", name);
            self.modes.insert(name, mode);
        }
        Ok(())
    }

    /// Reads extra template modes from a JSON file.
    pub fn load_modes(&mut self, path: impl AsRef<Path>) -> EncounterResult<()> {
        let json = std::fs::read_to_string(path)?;
        self.merge_modes_json(&json)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for generators.
///
/// Generators produce content from a configuration and a random source, and can
/// check that what they produced satisfies their invariants.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> EncounterResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> EncounterResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation.
pub mod utils {
    use super::*;
    use rand::SeedableRng;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }
}
