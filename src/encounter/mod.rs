//! # Encounter Module
//!
//! Encounters, their persisted snapshots, the derived difficulty views and the
//! history/saved state machine.

pub mod classify;
pub mod state;

pub use classify::*;
pub use state::*;

use crate::monsters::{experience_of, Monster, MonsterCatalog};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A number of copies of one monster.
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterGroup {
    pub monster: Arc<Monster>,
    /// Always at least 1 while the group is part of an encounter
    pub count: u32,
}

impl EncounterGroup {
    pub fn new(monster: Arc<Monster>, count: u32) -> Self {
        Self { monster, count }
    }
}

/// An ordered list of monster groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encounter {
    pub groups: Vec<EncounterGroup>,
}

impl Encounter {
    pub fn new(groups: Vec<EncounterGroup>) -> Self {
        Self { groups }
    }

    /// Rebuilds an encounter from a snapshot, resolving slugs against `catalog`.
    ///
    /// Groups whose monster is no longer in the catalog are dropped.
    pub fn from_snapshot(snapshot: &EncounterSnapshot, catalog: &MonsterCatalog) -> Self {
        let groups = snapshot
            .groups
            .iter()
            .filter(|group| group.count > 0)
            .filter_map(|group| match catalog.lookup(&group.monster.slug) {
                Some(monster) => Some(EncounterGroup::new(monster, group.count)),
                None => {
                    log::debug!(
                        "Dropping stale monster reference {} ({})",
                        group.monster.name,
                        group.monster.slug
                    );
                    None
                }
            })
            .collect();

        Self { groups }
    }

    /// Captures the encounter as slug references, skipping empty groups.
    pub fn snapshot(&self) -> EncounterSnapshot {
        EncounterSnapshot {
            groups: self
                .groups
                .iter()
                .filter(|group| group.count > 0)
                .map(|group| SnapshotGroup {
                    monster: MonsterRef {
                        name: group.monster.name.clone(),
                        slug: group.monster.slug.clone(),
                    },
                    count: group.count,
                })
                .collect(),
        }
    }

    /// Total experience of every monster against a party of `party_level`.
    ///
    /// Saturates at `u32::MAX` instead of overflowing.
    pub fn total_exp(&self, party_level: i32) -> u32 {
        self.groups.iter().fold(0u32, |total, group| {
            total.saturating_add(experience_of(&group.monster, party_level).saturating_mul(group.count))
        })
    }

    pub fn total_monsters(&self) -> u32 {
        self.groups
            .iter()
            .fold(0u32, |total, group| total.saturating_add(group.count))
    }

    /// Index of the group holding the monster with `slug`.
    pub fn position(&self, slug: &str) -> Option<usize> {
        self.groups.iter().position(|group| group.monster.slug == slug)
    }

    pub fn contains(&self, monster: &Monster) -> bool {
        self.position(&monster.slug).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// One-line "Name xN, ..." summary.
    pub fn summary(&self) -> String {
        self.groups
            .iter()
            .map(|group| format!("{} x{}", group.monster.name, group.count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Name and slug of a monster, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterRef {
    pub name: String,
    pub slug: String,
}

/// A persisted encounter group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotGroup {
    pub monster: MonsterRef,
    pub count: u32,
}

/// A persisted encounter, stored as a plain JSON array of groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncounterSnapshot {
    pub groups: Vec<SnapshotGroup>,
}

impl EncounterSnapshot {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// `(slug, count)` pairs in order.
    pub fn slug_counts(&self) -> Vec<(String, u32)> {
        self.groups
            .iter()
            .map(|group| (group.monster.slug.clone(), group.count))
            .collect()
    }
}
