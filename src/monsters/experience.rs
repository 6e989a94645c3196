//! # Experience Table
//!
//! Maps the gap between a monster's challenge rating and the party level to an
//! experience value. Budget matching relies on the exact step boundaries below.

use super::Monster;

pub use crate::config::{MAX_CR, MIN_CR};

/// Experience value of a single monster of `monster_level` against a party of `party_level`.
///
/// # Examples
///
/// ```
/// use encounterforge::experience_value;
///
/// assert_eq!(experience_value(5, 5), 40);
/// assert_eq!(experience_value(5, 1), 10);
/// assert_eq!(experience_value(5, 0), 0);
/// assert_eq!(experience_value(5, 11), 300);
/// ```
pub fn experience_value(party_level: i32, monster_level: i32) -> u32 {
    match monster_level - party_level {
        diff if diff <= -5 => 0,
        -4 => 10,
        -3 => 15,
        -2 => 20,
        -1 => 30,
        0 => 40,
        1 => 60,
        2 => 80,
        3 => 120,
        4 => 160,
        5 => 240,
        _ => 300,
    }
}

/// Experience value of `monster` for the given party level.
///
/// Always computed from the level passed in, so a party level change is picked up
/// on the next call.
pub fn experience_of(monster: &Monster, party_level: i32) -> u32 {
    experience_value(party_level, monster.cr.numeric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_table() {
        let expected = [
            (-6, 0),
            (-5, 0),
            (-4, 10),
            (-3, 15),
            (-2, 20),
            (-1, 30),
            (0, 40),
            (1, 60),
            (2, 80),
            (3, 120),
            (4, 160),
            (5, 240),
            (6, 300),
            (12, 300),
        ];

        for (diff, exp) in expected {
            assert_eq!(experience_value(5, 5 + diff), exp, "diff {}", diff);
        }
    }

    #[test]
    fn test_weakest_tier_against_low_party() {
        assert_eq!(experience_value(-1, MIN_CR), 40);
        assert_eq!(experience_value(1, MIN_CR), 20);
    }

    proptest! {
        #[test]
        fn prop_non_decreasing_in_monster_level(party in -1i32..=25, level in -1i32..30) {
            prop_assert!(experience_value(party, level) <= experience_value(party, level + 1));
        }

        #[test]
        fn prop_depends_only_on_difference(party in -1i32..=25, level in -1i32..=30, shift in -5i32..=5) {
            prop_assert_eq!(
                experience_value(party, level),
                experience_value(party + shift, level + shift)
            );
        }
    }
}
