//! # Encounter Generation
//!
//! Builds a full encounter for a party and difficulty: resolve a template, split the
//! experience budget across its groups, and match each group to a monster.

use super::matcher::BudgetMatcher;
use super::templates::TemplateResolver;
use super::{GenerationConfig, Generator};
use crate::encounter::EncounterGroup;
use crate::monsters::{Filters, Monster, MonsterCatalog};
use crate::party::{Difficulty, Party};
use crate::{EncounterError, EncounterResult};
use rand::rngs::StdRng;
use std::collections::HashSet;

/// Generates encounter groups for one party, difficulty and template mode.
///
/// The whole encounter is built before anything is returned; if any group cannot be
/// matched the result is [`EncounterError::NoEligibleMonster`] and nothing is produced.
pub struct EncounterGenerator<'a> {
    pub party: &'a Party,
    pub catalog: &'a MonsterCatalog,
    pub filters: &'a Filters,
    pub difficulty: Difficulty,
    pub mode: String,
}

impl<'a> EncounterGenerator<'a> {
    pub fn new(
        party: &'a Party,
        catalog: &'a MonsterCatalog,
        filters: &'a Filters,
        difficulty: Difficulty,
        mode: impl Into<String>,
    ) -> Self {
        Self {
            party,
            catalog,
            filters,
            difficulty,
            mode: mode.into(),
        }
    }

    /// Experience budget for this generator's difficulty.
    pub fn budget(&self, config: &GenerationConfig) -> EncounterResult<f64> {
        let threshold = self
            .party
            .experience
            .budget_for(self.difficulty)
            .ok_or(EncounterError::BudgetUnavailable(self.difficulty))?;
        Ok(threshold as f64 * config.budget_factor)
    }
}

impl<'a> Generator<Vec<EncounterGroup>> for EncounterGenerator<'a> {
    fn generate(
        &self,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> EncounterResult<Vec<EncounterGroup>> {
        let budget = self.budget(config)?;
        let template =
            TemplateResolver::new(self.mode.clone(), self.party.total_players()).generate(config, rng)?;
        let matcher = BudgetMatcher::new(self.catalog, self.filters, self.party.level());

        log::debug!(
            "Generating {} encounter with budget {:.1} over {} groups",
            self.difficulty,
            budget,
            template.groups.len()
        );

        // Later template groups claim monsters first; the result keeps template order.
        let mut placed: Vec<EncounterGroup> = Vec::with_capacity(template.groups.len());
        for (index, group) in template.groups.iter().enumerate().rev() {
            let target = template.per_monster_target(index, budget);
            let count = group.count;
            let exclude = |monster: &Monster| {
                placed.iter().any(|g| g.monster.slug == monster.slug)
                    || (count > 1 && monster.is_unique)
            };

            let monster = matcher
                .find_monster(target, exclude, rng)
                .ok_or(EncounterError::NoEligibleMonster)?;
            log::debug!(
                "Group {}: {} x{} (target {:.1} exp each)",
                index,
                monster.name,
                count,
                target
            );
            placed.push(EncounterGroup::new(monster, count));
        }
        placed.reverse();

        Ok(placed)
    }

    fn validate(&self, content: &Vec<EncounterGroup>, _config: &GenerationConfig) -> EncounterResult<()> {
        let mut seen = HashSet::new();
        for group in content {
            if group.count == 0 {
                return Err(EncounterError::InvalidState(format!(
                    "{} has no copies",
                    group.monster.name
                )));
            }
            if group.count > 1 && group.monster.is_unique {
                return Err(EncounterError::InvalidState(format!(
                    "unique monster {} appears {} times",
                    group.monster.name, group.count
                )));
            }
            if !seen.insert(group.monster.slug.as_str()) {
                return Err(EncounterError::InvalidState(format!(
                    "{} appears in more than one group",
                    group.monster.name
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "EncounterGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{EncounterMode, GroupCount, GroupSpec, TemplateSample, TemplateSpec};
    use crate::{CatalogFilter, DifficultyThresholds, MonsterAttributes};
    use rand::SeedableRng;

    fn catalog() -> MonsterCatalog {
        let mut records = Vec::new();
        for level in -1..=12 {
            for name in ["Brute", "Skirmisher", "Caster"] {
                records.push(MonsterAttributes {
                    name: format!("{} {}", name, level),
                    level,
                    source: "Test".to_string(),
                    ..Default::default()
                });
            }
            records.push(MonsterAttributes {
                name: format!("Warlord {}", level),
                level,
                unique: true,
                source: "Test".to_string(),
                ..Default::default()
            });
        }
        MonsterCatalog::from_attributes(records)
    }

    fn party() -> Party {
        Party::new(4, 5, DifficultyThresholds::new(250, 500, 750, 1100))
    }

    fn config_with(samples: Vec<TemplateSample>) -> GenerationConfig {
        let mut config = GenerationConfig::for_testing(0);
        config
            .modes
            .insert("custom".to_string(), EncounterMode::new("Custom", samples));
        config
    }

    #[test]
    fn test_budget_includes_correction_factor() {
        let party = party();
        let catalog = catalog();
        let filters = Filters::default();
        let generator = EncounterGenerator::new(&party, &catalog, &filters, Difficulty::Medium, "random");

        let budget = generator.budget(&GenerationConfig::default()).unwrap();
        assert!((budget - 550.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_budget() {
        let mut party = party();
        party.experience.hard = 0;
        let catalog = catalog();
        let filters = Filters::default();
        let generator = EncounterGenerator::new(&party, &catalog, &filters, Difficulty::Hard, "random");
        let mut rng = StdRng::seed_from_u64(0);

        assert!(matches!(
            generator.generate(&GenerationConfig::default(), &mut rng),
            Err(EncounterError::BudgetUnavailable(Difficulty::Hard))
        ));
    }

    #[test]
    fn test_even_split_targets() {
        // Budget 550 over three single-monster groups: ~183.3 each. At party level 5 the
        // nearest step is CR 9 (160) rather than CR 10 (240).
        let config = config_with(vec![TemplateSample::Counts(vec![
            GroupCount::Fixed(1),
            GroupCount::Fixed(1),
            GroupCount::Fixed(1),
        ])]);
        let party = party();
        let catalog = catalog();
        let filters = Filters::default();
        let generator = EncounterGenerator::new(&party, &catalog, &filters, Difficulty::Medium, "custom");
        let mut rng = StdRng::seed_from_u64(4);

        let groups = generator.generate(&config, &mut rng).unwrap();
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.monster.cr.numeric == 9));
        generator.validate(&groups, &config).unwrap();
    }

    #[test]
    fn test_ratio_targets_and_order() {
        // Ratios 3:1 of 550: the boss target of 412.5 is past the top step, so the search
        // starts at CR 30 and widens down to CR 12. Minions get ~45.8 each, i.e. CR 5.
        let config = config_with(vec![TemplateSample::Spec(TemplateSpec {
            groups: vec![GroupSpec::fixed(1, Some(3.0)), GroupSpec::fixed(3, Some(1.0))],
            subtractive: false,
        })]);
        let party = party();
        let catalog = catalog();
        let filters = Filters::default();
        let generator = EncounterGenerator::new(&party, &catalog, &filters, Difficulty::Medium, "custom");
        let mut rng = StdRng::seed_from_u64(8);

        let groups = generator.generate(&config, &mut rng).unwrap();
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[0].monster.cr.numeric, 12);
        assert_eq!(groups[1].count, 3);
        assert_eq!(groups[1].monster.cr.numeric, 5);
        assert!(!groups[1].monster.is_unique);
    }

    #[test]
    fn test_no_duplicates_and_no_unique_multiples() {
        let config = GenerationConfig::new(0);
        let party = party();
        let catalog = catalog();
        let filters = Filters::default();
        let mut rng = StdRng::seed_from_u64(21);

        for mode in config.modes.keys() {
            let generator = EncounterGenerator::new(&party, &catalog, &filters, Difficulty::Hard, mode.clone());
            for _ in 0..25 {
                let groups = generator.generate(&config, &mut rng).unwrap();
                generator.validate(&groups, &config).unwrap();
            }
        }
    }

    #[test]
    fn test_exhausted_search_fails() {
        let config = GenerationConfig::new(0);
        let party = party();
        let catalog = catalog();
        let filters = Filters::new(CatalogFilter {
            search: Some("no such monster".to_string()),
            ..Default::default()
        });
        let generator = EncounterGenerator::new(&party, &catalog, &filters, Difficulty::Medium, "random");
        let mut rng = StdRng::seed_from_u64(0);

        assert!(matches!(
            generator.generate(&config, &mut rng),
            Err(EncounterError::NoEligibleMonster)
        ));
    }

    #[test]
    fn test_single_catalog_entry_cannot_fill_two_groups() {
        let config = config_with(vec![TemplateSample::Counts(vec![
            GroupCount::Fixed(1),
            GroupCount::Fixed(1),
        ])]);
        let party = party();
        let catalog = MonsterCatalog::from_attributes(vec![MonsterAttributes {
            name: "Lonely Ogre".to_string(),
            level: 6,
            source: "Test".to_string(),
            ..Default::default()
        }]);
        let filters = Filters::default();
        let generator = EncounterGenerator::new(&party, &catalog, &filters, Difficulty::Medium, "custom");
        let mut rng = StdRng::seed_from_u64(0);

        assert!(matches!(
            generator.generate(&config, &mut rng),
            Err(EncounterError::NoEligibleMonster)
        ));
    }
}
