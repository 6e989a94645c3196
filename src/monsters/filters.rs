//! # Catalog Filters
//!
//! Criteria used to narrow the monster catalog, and the user's active filter set.

use super::Monster;
use serde::{Deserialize, Serialize};

/// Criteria a monster must satisfy to be returned by [`super::MonsterCatalog::filter_by`].
///
/// Empty lists and `None` bounds match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFilter {
    /// Lowest challenge rating (inclusive)
    pub min_cr: Option<i32>,
    /// Highest challenge rating (inclusive)
    pub max_cr: Option<i32>,
    /// Accepted creature types, compared case-insensitively
    pub types: Vec<String>,
    /// Accepted sizes, compared case-insensitively
    pub sizes: Vec<String>,
    /// Tags of which a monster needs at least one
    pub tags: Vec<String>,
    /// Substring matched against the monster's searchable text
    pub search: Option<String>,
    /// Excludes unique monsters entirely
    pub hide_unique: bool,
}

impl CatalogFilter {
    /// Returns true when `monster` satisfies every criterion.
    pub fn matches(&self, monster: &Monster) -> bool {
        let cr = monster.cr.numeric;
        if self.min_cr.is_some_and(|min| cr < min) || self.max_cr.is_some_and(|max| cr > max) {
            return false;
        }

        if self.hide_unique && monster.is_unique {
            return false;
        }

        if !self.types.is_empty()
            && !self
                .types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&monster.creature_type))
        {
            return false;
        }

        if !self.sizes.is_empty() {
            let Some(size) = monster.size.as_deref() else {
                return false;
            };
            if !self.sizes.iter().any(|s| s.eq_ignore_ascii_case(size)) {
                return false;
            }
        }

        if !self.tags.is_empty()
            && !self
                .tags
                .iter()
                .any(|tag| monster.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
        {
            return false;
        }

        match &self.search {
            Some(search) if !search.is_empty() => {
                monster.searchable.contains(&search.to_lowercase())
            }
            _ => true,
        }
    }
}

/// Ad hoc challenge rating bounds merged over the active filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrOverride {
    pub min_cr: Option<i32>,
    pub max_cr: Option<i32>,
}

impl CrOverride {
    /// Pins both bounds to a single challenge rating.
    pub fn exact(cr: i32) -> Self {
        Self {
            min_cr: Some(cr),
            max_cr: Some(cr),
        }
    }
}

/// The user's active filter set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub active: CatalogFilter,
}

impl Filters {
    /// Creates a filter set from explicit criteria.
    pub fn new(active: CatalogFilter) -> Self {
        Self { active }
    }

    /// Returns the active criteria with `partial`'s bounds applied, leaving `self` untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use encounterforge::{CatalogFilter, CrOverride, Filters};
    ///
    /// let filters = Filters::new(CatalogFilter { min_cr: Some(0), ..Default::default() });
    /// let criteria = filters.overridden_copy(CrOverride::exact(4));
    /// assert_eq!(criteria.min_cr, Some(4));
    /// assert_eq!(criteria.max_cr, Some(4));
    /// assert_eq!(filters.active.min_cr, Some(0));
    /// ```
    pub fn overridden_copy(&self, partial: CrOverride) -> CatalogFilter {
        let mut criteria = self.active.clone();
        if partial.min_cr.is_some() {
            criteria.min_cr = partial.min_cr;
        }
        if partial.max_cr.is_some() {
            criteria.max_cr = partial.max_cr;
        }
        criteria
    }
}
