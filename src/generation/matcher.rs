//! # Budget Matcher
//!
//! Turns a per-monster experience target into a concrete monster: find the challenge
//! rating whose experience value is closest to the target, then widen the search when
//! nothing eligible sits at that rating.

use crate::monsters::{experience_value, CrOverride, Filters, Monster, MonsterCatalog, MAX_CR, MIN_CR};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Returns the challenge rating whose experience value is closest to `target_exp`.
///
/// Ratings are scanned from the top; at the first rating `i` worth less than the
/// target, the closer of `i` and `i + 1` wins, with ties going to `i`. Targets no
/// rating is worth less than map to [`MIN_CR`].
///
/// # Examples
///
/// ```
/// use encounterforge::{experience_value, find_nearest_cr};
///
/// assert_eq!(find_nearest_cr(experience_value(5, 7) as f64, 5), 7);
/// assert_eq!(find_nearest_cr(50.0, 5), 5);
/// assert_eq!(find_nearest_cr(0.0, 5), -1);
/// ```
pub fn find_nearest_cr(target_exp: f64, party_level: i32) -> i32 {
    for i in (MIN_CR..=MAX_CR).rev() {
        let lower = experience_value(party_level, i) as f64;
        if lower < target_exp {
            let upper = experience_value(party_level, i + 1) as f64;
            let nearest = if target_exp - lower <= upper - target_exp {
                i
            } else {
                i + 1
            };
            return nearest.min(MAX_CR);
        }
    }
    MIN_CR
}

/// The order in which challenge ratings are tried when widening a search.
///
/// Starts at the origin, steps down one rating at a time to [`MIN_CR`], then
/// restarts just above the origin and steps up to [`MAX_CR`].
///
/// # Examples
///
/// ```
/// use encounterforge::WideningSearch;
///
/// let order: Vec<i32> = WideningSearch::new(1).take(5).collect();
/// assert_eq!(order, vec![1, 0, -1, 2, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct WideningSearch {
    origin: i32,
    next: Option<i32>,
    descending: bool,
}

impl WideningSearch {
    pub fn new(origin: i32) -> Self {
        let origin = origin.clamp(MIN_CR, MAX_CR);
        Self {
            origin,
            next: Some(origin),
            descending: true,
        }
    }
}

impl Iterator for WideningSearch {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        let current = self.next?;

        let mut following = if self.descending { current - 1 } else { current + 1 };
        if self.descending && following < MIN_CR {
            self.descending = false;
            following = self.origin + 1;
        }
        self.next = (following <= MAX_CR).then_some(following);

        Some(current)
    }
}

/// Picks a random monster at exactly `cr` that passes the active filters and is not excluded.
pub fn select_candidate<F, R>(
    catalog: &MonsterCatalog,
    filters: &Filters,
    cr: i32,
    exclude: F,
    rng: &mut R,
) -> Option<Arc<Monster>>
where
    F: Fn(&Monster) -> bool,
    R: Rng + ?Sized,
{
    let criteria = filters.overridden_copy(CrOverride::exact(cr));
    let candidates = catalog.filter_by(&criteria, |monster| !exclude(monster));
    candidates.choose(rng).cloned()
}

/// Finds monsters for experience targets against one catalog, filter set and party level.
#[derive(Debug, Clone, Copy)]
pub struct BudgetMatcher<'a> {
    pub catalog: &'a MonsterCatalog,
    pub filters: &'a Filters,
    pub party_level: i32,
}

impl<'a> BudgetMatcher<'a> {
    pub fn new(catalog: &'a MonsterCatalog, filters: &'a Filters, party_level: i32) -> Self {
        Self {
            catalog,
            filters,
            party_level,
        }
    }

    /// Finds a monster worth about `target_exp`, widening the search as needed.
    ///
    /// Returns `None` once every challenge rating has been tried.
    pub fn find_monster<F, R>(&self, target_exp: f64, exclude: F, rng: &mut R) -> Option<Arc<Monster>>
    where
        F: Fn(&Monster) -> bool,
        R: Rng + ?Sized,
    {
        let origin = find_nearest_cr(target_exp, self.party_level);
        log::debug!(
            "Target {:.1} exp at party level {} -> CR {}",
            target_exp,
            self.party_level,
            origin
        );

        for cr in WideningSearch::new(origin) {
            if let Some(monster) = select_candidate(self.catalog, self.filters, cr, &exclude, rng) {
                if cr != origin {
                    log::debug!("Widened search from CR {} to CR {}", origin, cr);
                }
                return Some(monster);
            }
        }

        log::warn!("No eligible monster for target {:.1} exp", target_exp);
        None
    }
}
