//! # Party Module
//!
//! The adventuring party as seen by the encounter engine: player groups, the party
//! level used for experience lookups, and the per-difficulty experience thresholds.

use crate::config::{DEFAULT_GROUP_LEVEL, DEFAULT_GROUP_PLAYERS};
use crate::{EncounterError, EncounterResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Target difficulty for a generated encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Deadly,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Deadly => "deadly",
        }
    }

    /// Returns all difficulties, easiest first.
    pub fn all() -> [Difficulty; 4] {
        [
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Deadly,
        ]
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = EncounterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "deadly" => Ok(Difficulty::Deadly),
            other => Err(EncounterError::InvalidState(format!(
                "unknown difficulty '{}'",
                other
            ))),
        }
    }
}

/// Experience totals at which each difficulty begins. Expected to be increasing.
///
/// A zero entry means the party has no budget for that difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyThresholds {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
    pub deadly: u32,
    /// Total experience the party can handle in one adventuring day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<u32>,
}

impl DifficultyThresholds {
    pub fn new(easy: u32, medium: u32, hard: u32, deadly: u32) -> Self {
        Self {
            easy,
            medium,
            hard,
            deadly,
            daily: None,
        }
    }

    pub fn with_daily(mut self, daily: u32) -> Self {
        self.daily = Some(daily);
        self
    }

    /// Returns the experience budget for `difficulty`, or `None` when it is undefined.
    pub fn budget_for(&self, difficulty: Difficulty) -> Option<u32> {
        let value = match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
            Difficulty::Deadly => self.deadly,
        };
        (value > 0).then_some(value)
    }

    /// Named bands in ascending order, as used by the difficulty feel.
    pub fn bands(&self) -> Vec<(&'static str, u32)> {
        let mut bands = vec![
            ("easy", self.easy),
            ("medium", self.medium),
            ("hard", self.hard),
            ("deadly", self.deadly),
        ];
        if let Some(daily) = self.daily {
            bands.push(("daily", daily));
        }
        bands
    }
}

/// A set of players sharing one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerGroup {
    pub players: u32,
    pub level: i32,
}

impl Default for PlayerGroup {
    fn default() -> Self {
        Self {
            players: DEFAULT_GROUP_PLAYERS,
            level: DEFAULT_GROUP_LEVEL,
        }
    }
}

/// The party an encounter is built for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub groups: Vec<PlayerGroup>,
    pub experience: DifficultyThresholds,
}

impl Party {
    /// Creates a party with a single group.
    ///
    /// # Examples
    ///
    /// ```
    /// use encounterforge::{DifficultyThresholds, Party};
    ///
    /// let party = Party::new(4, 5, DifficultyThresholds::new(250, 500, 750, 1100));
    /// assert_eq!(party.total_players(), 4);
    /// assert_eq!(party.level(), 5);
    /// ```
    pub fn new(players: u32, level: i32, experience: DifficultyThresholds) -> Self {
        Self {
            groups: vec![PlayerGroup { players, level }],
            experience,
        }
    }

    /// Reads a party description from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> EncounterResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn total_players(&self) -> u32 {
        self.groups.iter().map(|g| g.players).sum()
    }

    /// The level experience lookups are made against.
    ///
    /// Only the first group counts; other groups' levels are not averaged in.
    pub fn level(&self) -> i32 {
        self.groups
            .first()
            .map(|g| g.level)
            .unwrap_or(DEFAULT_GROUP_LEVEL)
    }

    /// Makes sure the party has at least one group.
    pub fn ensure_group(&mut self) {
        if self.groups.is_empty() {
            self.add_player_group();
        }
    }

    /// Appends a default player group.
    pub fn add_player_group(&mut self) {
        log::debug!("Adding default player group to party");
        self.groups.push(PlayerGroup::default());
    }
}
