//! # Encounter Templates
//!
//! Named template modes, their samples, and the resolver that turns a sample into a
//! concrete [`EncounterTemplate`] for the current party size.

use super::expression::resolve_count;
use super::{GenerationConfig, Generator};
use crate::{EncounterError, EncounterResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Group size as written in a template: a number or a symbolic expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupCount {
    Fixed(u32),
    Expression(String),
}

/// One group of a template before resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub count: GroupCount,
    /// Relative share of the budget; 1 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
}

impl GroupSpec {
    pub fn fixed(count: u32, ratio: Option<f64>) -> Self {
        Self {
            count: GroupCount::Fixed(count),
            ratio,
        }
    }

    pub fn expression(count: &str, ratio: Option<f64>) -> Self {
        Self {
            count: GroupCount::Expression(count.to_string()),
            ratio,
        }
    }
}

/// A template written out group by group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub groups: Vec<GroupSpec>,
    #[serde(default)]
    pub subtractive: bool,
}

/// One candidate template of a mode.
///
/// A bare list of counts is the proportional form used by random mode: every
/// group gets an even share of the budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateSample {
    Counts(Vec<GroupCount>),
    Spec(TemplateSpec),
}

impl TemplateSample {
    fn into_spec(self) -> TemplateSpec {
        match self {
            TemplateSample::Counts(counts) => TemplateSpec {
                groups: counts
                    .into_iter()
                    .map(|count| GroupSpec { count, ratio: None })
                    .collect(),
                subtractive: true,
            },
            TemplateSample::Spec(spec) => spec,
        }
    }
}

/// A named set of template samples to pick from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterMode {
    /// Display name
    pub name: String,
    pub samples: Vec<TemplateSample>,
}

impl EncounterMode {
    pub fn new(name: &str, samples: Vec<TemplateSample>) -> Self {
        Self {
            name: name.to_string(),
            samples,
        }
    }
}

/// A resolved template group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateGroup {
    /// Number of monsters in the group, at least 1
    pub count: u32,
    /// Normalized share of the budget (ratio templates only)
    pub ratio: Option<f64>,
}

/// A template with every count resolved for the current party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterTemplate {
    pub groups: Vec<TemplateGroup>,
    /// Groups split the budget evenly instead of by ratio
    pub subtractive: bool,
    /// Total number of monsters
    pub total: u32,
    /// Sum of the raw ratios before normalization (ratio templates only)
    pub overall_ratio: Option<f64>,
}

impl EncounterTemplate {
    /// Share of `budget` assigned to the group at `index`, before dividing by its count.
    ///
    /// Subtractive templates split the full budget evenly across groups; the share does
    /// not shrink by what earlier groups spent.
    pub fn group_share(&self, index: usize, budget: f64) -> f64 {
        if self.subtractive {
            budget / self.groups.len() as f64
        } else {
            let ratio = self.groups[index]
                .ratio
                .unwrap_or(1.0 / self.groups.len() as f64);
            budget * ratio
        }
    }

    /// Experience target for a single monster of the group at `index`.
    pub fn per_monster_target(&self, index: usize, budget: f64) -> f64 {
        self.group_share(index, budget) / self.groups[index].count as f64
    }
}

/// Picks and resolves a template of one mode for a party of a given size.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    pub mode: String,
    pub players: u32,
}

impl TemplateResolver {
    pub fn new(mode: impl Into<String>, players: u32) -> Self {
        Self {
            mode: mode.into(),
            players,
        }
    }

    fn resolve_group_count(&self, count: &GroupCount, rng: &mut StdRng) -> EncounterResult<u32> {
        match count {
            GroupCount::Fixed(0) => Err(EncounterError::InvalidTemplate(
                "group count must be at least 1".to_string(),
            )),
            GroupCount::Fixed(n) => Ok(*n),
            GroupCount::Expression(source) => resolve_count(source, self.players, rng),
        }
    }
}

impl Generator<EncounterTemplate> for TemplateResolver {
    fn generate(
        &self,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> EncounterResult<EncounterTemplate> {
        let mode = config.mode(&self.mode)?;
        let sample = mode.samples.choose(rng).cloned().ok_or_else(|| {
            EncounterError::InvalidTemplate(format!("mode '{}' has no samples", self.mode))
        })?;
        let spec = sample.into_spec();

        if spec.groups.is_empty() {
            return Err(EncounterError::InvalidTemplate(format!(
                "a '{}' sample has no groups",
                self.mode
            )));
        }

        let mut groups = Vec::with_capacity(spec.groups.len());
        for group in &spec.groups {
            if group.ratio.is_some_and(|r| !r.is_finite() || r < 0.0) {
                return Err(EncounterError::InvalidTemplate(format!(
                    "negative or non-finite ratio in '{}'",
                    self.mode
                )));
            }
            groups.push(TemplateGroup {
                count: self.resolve_group_count(&group.count, rng)?,
                ratio: group.ratio,
            });
        }

        let total = groups.iter().map(|g| g.count).sum();

        let overall_ratio = if spec.subtractive {
            None
        } else {
            let overall: f64 = groups.iter().map(|g| g.ratio.unwrap_or(1.0)).sum();
            if overall <= 0.0 {
                return Err(EncounterError::InvalidTemplate(format!(
                    "ratios in '{}' sum to zero",
                    self.mode
                )));
            }
            for group in &mut groups {
                group.ratio = Some(group.ratio.unwrap_or(1.0) / overall);
            }
            Some(overall)
        };

        let template = EncounterTemplate {
            groups,
            subtractive: spec.subtractive,
            total,
            overall_ratio,
        };
        log::debug!("Resolved '{}' template: {:?}", self.mode, template);
        Ok(template)
    }

    fn validate(&self, content: &EncounterTemplate, _config: &GenerationConfig) -> EncounterResult<()> {
        if content.groups.iter().any(|g| g.count == 0) {
            return Err(EncounterError::InvalidTemplate(
                "group with zero monsters".to_string(),
            ));
        }

        if content.total != content.groups.iter().map(|g| g.count).sum::<u32>() {
            return Err(EncounterError::InvalidTemplate(
                "total does not match group counts".to_string(),
            ));
        }

        if !content.subtractive {
            let sum: f64 = content.groups.iter().filter_map(|g| g.ratio).sum();
            if (sum - 1.0).abs() > 1e-9 {
                return Err(EncounterError::InvalidTemplate(format!(
                    "ratios sum to {} instead of 1",
                    sum
                )));
            }
        }

        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "TemplateResolver"
    }
}

/// The template modes available without any configuration file.
pub fn builtin_modes() -> BTreeMap<String, EncounterMode> {
    use GroupCount::Fixed;

    let counts = |counts: &[u32]| TemplateSample::Counts(counts.iter().map(|&c| Fixed(c)).collect());
    let spec = |groups: Vec<GroupSpec>| {
        TemplateSample::Spec(TemplateSpec {
            groups,
            subtractive: false,
        })
    };

    let mut modes = BTreeMap::new();
    modes.insert(
        "random".to_string(),
        EncounterMode::new(
            "Random",
            vec![
                counts(&[1]),
                counts(&[1, 2]),
                counts(&[1, 5]),
                counts(&[1, 1, 1]),
                counts(&[1, 1, 2]),
                counts(&[1, 3]),
                counts(&[2, 2]),
                counts(&[2, 4]),
                counts(&[8]),
            ],
        ),
    );
    modes.insert(
        "solo".to_string(),
        EncounterMode::new("Solo boss", vec![spec(vec![GroupSpec::fixed(1, None)])]),
    );
    modes.insert(
        "duo".to_string(),
        EncounterMode::new(
            "Duo",
            vec![spec(vec![GroupSpec::fixed(1, None), GroupSpec::fixed(1, None)])],
        ),
    );
    modes.insert(
        "boss_minions".to_string(),
        EncounterMode::new(
            "Boss and minions",
            vec![
                spec(vec![
                    GroupSpec::fixed(1, Some(2.0)),
                    GroupSpec::expression("2-5", Some(1.0)),
                ]),
                spec(vec![
                    GroupSpec::fixed(1, Some(3.0)),
                    GroupSpec::expression("players-players*2", Some(1.0)),
                ]),
            ],
        ),
    );
    modes.insert(
        "lieutenants".to_string(),
        EncounterMode::new(
            "Boss and lieutenants",
            vec![
                spec(vec![GroupSpec::fixed(1, Some(3.0)), GroupSpec::fixed(2, Some(2.0))]),
                spec(vec![
                    GroupSpec::fixed(1, Some(4.0)),
                    GroupSpec::fixed(1, Some(1.0)),
                    GroupSpec::fixed(1, Some(1.0)),
                ]),
            ],
        ),
    );
    modes.insert(
        "horde".to_string(),
        EncounterMode::new(
            "Horde",
            vec![
                spec(vec![GroupSpec::expression("players*2-players*3", None)]),
                spec(vec![
                    GroupSpec::expression("players+2", Some(1.0)),
                    GroupSpec::expression("players", Some(1.0)),
                ]),
            ],
        ),
    );
    modes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn config_with(name: &str, samples: Vec<TemplateSample>) -> GenerationConfig {
        let mut config = GenerationConfig::for_testing(0);
        config
            .modes
            .insert(name.to_string(), EncounterMode::new(name, samples));
        config
    }

    #[test]
    fn test_count_list_becomes_subtractive() {
        let config = config_with(
            "pairs",
            vec![TemplateSample::Counts(vec![
                GroupCount::Fixed(2),
                GroupCount::Expression("players".to_string()),
            ])],
        );
        let resolver = TemplateResolver::new("pairs", 5);
        let mut rng = StdRng::seed_from_u64(3);

        let template = resolver.generate(&config, &mut rng).unwrap();
        assert!(template.subtractive);
        assert_eq!(template.total, 7);
        assert_eq!(template.overall_ratio, None);
        assert!(template.groups.iter().all(|g| g.ratio.is_none()));
        resolver.validate(&template, &config).unwrap();
    }

    #[test]
    fn test_ratios_are_normalized() {
        let config = config_with(
            "weighted",
            vec![TemplateSample::Spec(TemplateSpec {
                groups: vec![
                    GroupSpec::fixed(1, Some(3.0)),
                    GroupSpec::fixed(2, None),
                    GroupSpec::fixed(1, Some(4.0)),
                ],
                subtractive: false,
            })],
        );
        let resolver = TemplateResolver::new("weighted", 4);
        let mut rng = StdRng::seed_from_u64(3);

        let template = resolver.generate(&config, &mut rng).unwrap();
        assert_eq!(template.overall_ratio, Some(8.0));
        let ratios: Vec<f64> = template.groups.iter().map(|g| g.ratio.unwrap()).collect();
        assert_eq!(ratios, vec![0.375, 0.125, 0.5]);
        resolver.validate(&template, &config).unwrap();
    }

    #[test]
    fn test_even_split_uses_full_budget_per_group() {
        // Each group gets budget / groups regardless of what other groups spend.
        let template = EncounterTemplate {
            groups: vec![
                TemplateGroup { count: 1, ratio: None },
                TemplateGroup { count: 1, ratio: None },
                TemplateGroup { count: 2, ratio: None },
            ],
            subtractive: true,
            total: 4,
            overall_ratio: None,
        };

        let share = template.group_share(0, 550.0);
        assert!((share - 183.333).abs() < 0.001);
        assert!((template.per_monster_target(2, 550.0) - 91.666).abs() < 0.001);
    }

    #[test]
    fn test_ratio_share() {
        let template = EncounterTemplate {
            groups: vec![
                TemplateGroup { count: 1, ratio: Some(0.75) },
                TemplateGroup { count: 3, ratio: Some(0.25) },
            ],
            subtractive: false,
            total: 4,
            overall_ratio: Some(4.0),
        };

        assert_eq!(template.group_share(0, 400.0), 300.0);
        assert!((template.per_monster_target(1, 400.0) - 33.333).abs() < 0.001);
    }

    #[test]
    fn test_zero_fixed_count_is_rejected() {
        let config = config_with("broken", vec![TemplateSample::Counts(vec![GroupCount::Fixed(0)])]);
        let mut rng = StdRng::seed_from_u64(0);
        let result = TemplateResolver::new("broken", 4).generate(&config, &mut rng);
        assert!(matches!(result, Err(EncounterError::InvalidTemplate(_))));
    }

    #[test]
    fn test_builtin_modes_resolve() {
        let config = GenerationConfig::new(0);
        let mut rng = StdRng::seed_from_u64(11);

        for name in config.modes.keys() {
            let resolver = TemplateResolver::new(name.clone(), 4);
            for _ in 0..20 {
                let template = resolver.generate(&config, &mut rng).unwrap();
                resolver.validate(&template, &config).unwrap();
                assert!(template.total >= 1);
            }
        }
    }

    #[test]
    fn test_horde_scales_with_players() {
        let config = config_with(
            "horde",
            vec![TemplateSample::Spec(TemplateSpec {
                groups: vec![GroupSpec::expression("players*2-players*3", None)],
                subtractive: false,
            })],
        );
        let mut rng = StdRng::seed_from_u64(5);

        let template = TemplateResolver::new("horde", 4).generate(&config, &mut rng).unwrap();
        assert!((8..=12).contains(&template.total));
        assert_eq!(template.groups[0].ratio, Some(1.0));
    }

    #[test]
    fn test_sample_json_shapes() {
        let samples: Vec<TemplateSample> =
            serde_json::from_str(r#"[[1, 2], {"groups": [{"count": "2-4", "ratio": 2}], "subtractive": true}]"#)
                .unwrap();

        assert_eq!(
            samples[0],
            TemplateSample::Counts(vec![GroupCount::Fixed(1), GroupCount::Fixed(2)])
        );
        match &samples[1] {
            TemplateSample::Spec(spec) => {
                assert!(spec.subtractive);
                assert_eq!(spec.groups[0].count, GroupCount::Expression("2-4".to_string()));
                assert_eq!(spec.groups[0].ratio, Some(2.0));
            }
            other => panic!("expected spec sample, got {:?}", other),
        }
    }
}
