//! # Difficulty Classification
//!
//! Read-only views explaining an encounter's total experience: a difficulty label,
//! the threat thresholds for the party size, and a narrative "feels like" label.

use crate::party::DifficultyThresholds;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Flavour text for encounters well past the daily budget.
const INSANE_DIFFICULTY_STRINGS: [&str; 9] = [
    "an incredibly bad idea",
    "suicide",
    "/r/rpghorrorstories",
    "an angry table",
    "the BBEG wrote this encounter",
    "the party's final session",
    "someone forgot to bring snacks",
    "rocks fall",
    "someone insulted the DM",
];

/// Difficulty label for an encounter's total experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DifficultyRating {
    None,
    Trivial,
    Easy,
    Medium,
    Hard,
    Deadly,
}

impl fmt::Display for DifficultyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DifficultyRating::None => "None",
            DifficultyRating::Trivial => "Trivial",
            DifficultyRating::Easy => "Easy",
            DifficultyRating::Medium => "Medium",
            DifficultyRating::Hard => "Hard",
            DifficultyRating::Deadly => "Deadly",
        };
        f.write_str(label)
    }
}

/// Labels `total_exp` by the first threshold it falls strictly below.
///
/// # Examples
///
/// ```
/// use encounterforge::{classify, DifficultyRating, DifficultyThresholds};
///
/// let thresholds = DifficultyThresholds::new(250, 500, 750, 1100);
/// assert_eq!(classify(0, &thresholds), DifficultyRating::None);
/// assert_eq!(classify(600, &thresholds), DifficultyRating::Medium);
/// assert_eq!(classify(1100, &thresholds), DifficultyRating::Deadly);
/// ```
pub fn classify(total_exp: u32, thresholds: &DifficultyThresholds) -> DifficultyRating {
    if total_exp == 0 {
        DifficultyRating::None
    } else if total_exp < thresholds.easy {
        DifficultyRating::Trivial
    } else if total_exp < thresholds.medium {
        DifficultyRating::Easy
    } else if total_exp < thresholds.hard {
        DifficultyRating::Medium
    } else if total_exp < thresholds.deadly {
        DifficultyRating::Hard
    } else {
        DifficultyRating::Deadly
    }
}

/// Divisors applied to the thresholds for a given party size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreatMultipliers {
    pub single: f64,
    pub pair: f64,
    pub group: f64,
    pub trivial: f64,
}

impl ThreatMultipliers {
    /// Small parties (under 3) get larger divisors, large parties (over 5) smaller ones.
    pub fn for_party_size(party_size: u32) -> Self {
        match party_size {
            0..=2 => Self {
                single: 1.5,
                pair: 2.0,
                group: 2.5,
                trivial: 3.0,
            },
            3..=5 => Self {
                single: 1.0,
                pair: 1.5,
                group: 2.0,
                trivial: 2.5,
            },
            _ => Self {
                single: 0.5,
                pair: 1.0,
                group: 1.5,
                trivial: 2.0,
            },
        }
    }
}

/// Experience a single monster (or a pair, group of four, or swarm of eight) must
/// reach to pose each level of threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatThresholds {
    pub deadly: u32,
    pub hard: u32,
    pub medium: u32,
    pub easy: u32,
    pub pair: u32,
    pub group: u32,
    pub trivial: u32,
}

/// Scales `base` thresholds for a party of `party_size`.
///
/// # Examples
///
/// ```
/// use encounterforge::{threat_thresholds, DifficultyThresholds};
///
/// let base = DifficultyThresholds::new(250, 500, 750, 1100);
/// let threat = threat_thresholds(2, base.medium, &base);
/// assert_eq!(threat.medium, 333);
/// ```
pub fn threat_thresholds(
    party_size: u32,
    medium_exp: u32,
    base: &DifficultyThresholds,
) -> ThreatThresholds {
    let m = ThreatMultipliers::for_party_size(party_size);
    let scale = |exp: u32, divisor: f64| (exp as f64 / divisor).floor() as u32;

    ThreatThresholds {
        deadly: scale(base.deadly, m.single),
        hard: scale(base.hard, m.single),
        medium: scale(medium_exp, m.single),
        easy: scale(base.easy, m.single),
        pair: scale(medium_exp, 2.0 * m.pair),
        group: scale(medium_exp, 4.0 * m.group),
        trivial: scale(medium_exp, 8.0 * m.trivial),
    }
}

/// Position of `value` within `lower..upper`, as a fraction of the band width.
fn band_ratio(lower: u32, upper: u32, value: u32) -> Option<f64> {
    (upper > lower).then(|| (value as f64 - lower as f64) / (upper as f64 - lower as f64))
}

/// Describes how `total_exp` feels relative to the ordered threshold `bands`.
///
/// Within a band the lower name is used for the bottom 70% and the upper name above
/// that. Past a `daily` band the label escalates; below the first band the encounter
/// is a nuisance. Returns an empty string for zero experience.
pub fn difficulty_feel<R: Rng + ?Sized>(
    total_exp: u32,
    bands: &[(&str, u32)],
    rng: &mut R,
) -> String {
    if total_exp == 0 || bands.is_empty() {
        return String::new();
    }

    for window in bands.windows(2) {
        let (lower_key, lower_value) = window[0];
        let (upper_key, upper_value) = window[1];
        let Some(ratio) = band_ratio(lower_value, upper_value, total_exp) else {
            continue;
        };

        if ratio >= 10.0 {
            return "... what.".to_string();
        }

        if upper_key == "daily" && ratio >= 0.0 {
            if ratio >= 1.0 {
                let insane = INSANE_DIFFICULTY_STRINGS
                    .choose(rng)
                    .copied()
                    .unwrap_or("rocks fall");
                return format!("like {}", insane);
            }
            if ratio >= 0.6 {
                return "extremely deadly".to_string();
            }
            if ratio >= 0.2 {
                return "really deadly".to_string();
            }
            return lower_key.to_string();
        }

        if (0.0..=1.0).contains(&ratio) {
            let key = if ratio > 0.7 { upper_key } else { lower_key };
            return key.to_string();
        }
    }

    if let Some(&(top_key, top_value)) = bands.last() {
        if total_exp >= top_value && top_key != "daily" {
            return top_key.to_string();
        }
    }

    match band_ratio(0, bands[0].1, total_exp) {
        Some(ratio) if ratio > 0.5 => "like a nuisance".to_string(),
        _ => "like a minor nuisance".to_string(),
    }
}
