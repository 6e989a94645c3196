//! # Encounter State
//!
//! The current encounter together with its generation history and the user's saved
//! encounters.
//!
//! Every successful mutation is snapshotted into history. A fresh generation starts a
//! new history entry; manual edits (adding, incrementing, rerolling) rewrite the
//! latest one. Saved encounters are only written by an explicit [`EncounterState::save`].

use super::{classify, difficulty_feel, threat_thresholds, DifficultyRating, Encounter, EncounterGroup};
use super::{EncounterSnapshot, ThreatThresholds};
use crate::config::{DEFAULT_DIFFICULTY, DEFAULT_MODE};
use crate::generation::{EncounterGenerator, GenerationConfig, Generator};
use crate::monsters::{CrOverride, Filters, Monster, MonsterCatalog};
use crate::notify::{Notification, Notifier, Severity};
use crate::party::{Difficulty, Party};
use crate::storage::{migrate, KeyValueStore};
use crate::{EncounterError, EncounterResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Storage keys, as `(legacy, current)` pairs where the key was renamed.
pub mod keys {
    pub const GROUPS: &str = "encounterGroups";
    pub const LOADED_INDEX: (&str, &str) = ("encounterLoadedIndex", "loadedEncounterIndex");
    pub const DIFFICULTY: (&str, &str) = ("encounterDifficulty", "difficulty");
    pub const MODE: (&str, &str) = ("encounterGenerateType", "encounterType");
    pub const HISTORY: (&str, &str) = ("encounterGenerateHistory", "encounterHistory");
    pub const SAVED: (&str, &str) = ("encounterSaved", "savedEncounters");
}

/// Where the displayed encounter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provenance {
    /// Generated or built by hand
    #[default]
    Fresh,
    /// Reloaded from the history list
    History,
    /// Loaded from the saved slot at this index
    Saved(usize),
}

/// The collaborators encounter operations work against.
pub struct EncounterContext<'a> {
    pub party: &'a mut Party,
    pub catalog: &'a MonsterCatalog,
    pub filters: &'a Filters,
    pub notifier: &'a dyn Notifier,
    pub config: &'a GenerationConfig,
}

/// Current encounter, history and saved encounters.
#[derive(Debug, Clone)]
pub struct EncounterState {
    pub encounter: Encounter,
    /// Oldest first
    pub history: Vec<EncounterSnapshot>,
    pub saved: Vec<EncounterSnapshot>,
    pub provenance: Provenance,
    /// Difficulty used by [`EncounterState::generate`]
    pub difficulty: Difficulty,
    /// Template mode used by [`EncounterState::generate`]
    pub mode: String,
}

impl Default for EncounterState {
    fn default() -> Self {
        Self::new()
    }
}

fn check_index(index: usize, len: usize) -> EncounterResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(EncounterError::InvalidIndex { index, len })
    }
}

impl EncounterState {
    /// Creates an empty state with the default difficulty and mode.
    pub fn new() -> Self {
        Self {
            encounter: Encounter::default(),
            history: Vec::new(),
            saved: Vec::new(),
            provenance: Provenance::Fresh,
            difficulty: DEFAULT_DIFFICULTY.parse().unwrap_or(Difficulty::Medium),
            mode: DEFAULT_MODE.to_string(),
        }
    }

    /// Restores state from `store`, re-resolving monsters against `catalog`.
    pub fn restore<S: KeyValueStore>(store: &mut S, catalog: &MonsterCatalog) -> EncounterResult<Self> {
        let groups: EncounterSnapshot = store.get_as(keys::GROUPS).unwrap_or_default();
        let loaded_index: Option<usize> =
            migrate(store, keys::LOADED_INDEX.0, keys::LOADED_INDEX.1, None)?;
        let difficulty: Difficulty =
            migrate(store, keys::DIFFICULTY.0, keys::DIFFICULTY.1, Difficulty::Medium)?;
        let mode: String = migrate(store, keys::MODE.0, keys::MODE.1, DEFAULT_MODE.to_string())?;
        let history: Vec<EncounterSnapshot> =
            migrate(store, keys::HISTORY.0, keys::HISTORY.1, Vec::new())?;
        let saved: Vec<EncounterSnapshot> = migrate(store, keys::SAVED.0, keys::SAVED.1, Vec::new())?;

        let provenance = match loaded_index {
            Some(index) if index < saved.len() => Provenance::Saved(index),
            _ => Provenance::Fresh,
        };

        let state = Self {
            encounter: Encounter::from_snapshot(&groups, catalog),
            history,
            saved,
            provenance,
            difficulty,
            mode,
        };
        log::debug!(
            "Restored encounter state: {} groups, {} history, {} saved",
            state.encounter.len(),
            state.history.len(),
            state.saved.len()
        );
        Ok(state)
    }

    /// Writes the state to `store`.
    pub fn persist<S: KeyValueStore>(&self, store: &mut S) -> EncounterResult<()> {
        store.set_as(keys::GROUPS, &self.encounter.snapshot())?;
        store.set_as(keys::LOADED_INDEX.1, &self.loaded_index())?;
        store.set_as(keys::DIFFICULTY.1, &self.difficulty)?;
        store.set_as(keys::MODE.1, &self.mode)?;
        store.set_as(keys::HISTORY.1, &self.history)?;
        store.set_as(keys::SAVED.1, &self.saved)?;
        Ok(())
    }

    /// Index of the saved encounter currently displayed, if any.
    pub fn loaded_index(&self) -> Option<usize> {
        match self.provenance {
            Provenance::Saved(index) => Some(index),
            _ => None,
        }
    }

    /// True when the displayed encounter was reloaded from history.
    pub fn loaded_last(&self) -> bool {
        self.provenance == Provenance::History
    }

    /// Generates a new encounter for the selected difficulty and mode.
    ///
    /// On failure the current encounter and history are left exactly as they were.
    pub fn generate(&mut self, ctx: &mut EncounterContext<'_>, rng: &mut StdRng) -> EncounterResult<()> {
        ctx.party
            .experience
            .budget_for(self.difficulty)
            .ok_or(EncounterError::BudgetUnavailable(self.difficulty))?;
        ctx.party.ensure_group();

        let generator = EncounterGenerator::new(
            &*ctx.party,
            ctx.catalog,
            ctx.filters,
            self.difficulty,
            self.mode.clone(),
        );

        let groups = match generator.generate(ctx.config, rng) {
            Ok(groups) => groups,
            Err(EncounterError::NoEligibleMonster) => {
                ctx.notifier.notify(
                    Notification::new("Failed to generate encounter!")
                        .with_body("Change the filters so that there are more monsters to sample from.")
                        .with_severity(Severity::Error),
                );
                return Err(EncounterError::NoEligibleMonster);
            }
            Err(e) => return Err(e),
        };
        generator.validate(&groups, ctx.config)?;

        self.encounter = Encounter::new(groups);
        self.provenance = Provenance::Fresh;
        self.save_to_history(true);
        log::info!(
            "Generated {} encounter: {}",
            self.difficulty,
            self.encounter.summary()
        );
        Ok(())
    }

    /// Adds one copy of `monster`, creating a group for it if needed.
    pub fn add_monster(&mut self, ctx: &mut EncounterContext<'_>, monster: Arc<Monster>) {
        if ctx.party.total_players() == 0 {
            ctx.party.add_player_group();
        }

        match self.encounter.position(&monster.slug) {
            Some(index) => self.encounter.groups[index].count += 1,
            None => self.encounter.groups.push(EncounterGroup::new(monster, 1)),
        }

        self.save_to_history(false);
    }

    /// Adds one copy to the group at `index`.
    pub fn increment(&mut self, index: usize) -> EncounterResult<()> {
        check_index(index, self.encounter.len())?;
        self.encounter.groups[index].count += 1;
        self.save_to_history(false);
        Ok(())
    }

    /// Removes one copy from the group at `index`, dropping the group when it empties.
    pub fn decrement(&mut self, index: usize) -> EncounterResult<()> {
        check_index(index, self.encounter.len())?;
        let group = &mut self.encounter.groups[index];
        group.count = group.count.saturating_sub(1);
        if group.count == 0 {
            self.encounter.groups.remove(index);
        }
        self.save_to_history(false);
        Ok(())
    }

    /// Swaps the monster of the group at `index` for another of the same challenge rating.
    ///
    /// Returns `false` when no other eligible monster exists.
    pub fn reroll(
        &mut self,
        ctx: &EncounterContext<'_>,
        index: usize,
        rng: &mut impl Rng,
    ) -> EncounterResult<bool> {
        check_index(index, self.encounter.len())?;
        let group = &self.encounter.groups[index];
        let criteria = ctx
            .filters
            .overridden_copy(CrOverride::exact(group.monster.cr.numeric));
        let count = group.count;

        let candidates = ctx.catalog.filter_by(&criteria, |monster| {
            !self.encounter.contains(monster) && !(count > 1 && monster.is_unique)
        });
        let Some(monster) = candidates.choose(rng).cloned() else {
            return Ok(false);
        };

        log::debug!(
            "Rerolled {} into {}",
            self.encounter.groups[index].monster.name,
            monster.name
        );
        self.encounter.groups[index].monster = monster;
        self.save_to_history(false);
        Ok(true)
    }

    /// Records the current encounter in history.
    fn save_to_history(&mut self, new_entry: bool) {
        let snapshot = self.encounter.snapshot();

        if snapshot.is_empty() {
            if self.history.pop().is_some() && self.provenance == Provenance::History {
                self.provenance = Provenance::Fresh;
            }
            return;
        }

        if new_entry || self.history.is_empty() {
            self.history.push(snapshot);
        } else if let Some(last) = self.history.last_mut() {
            *last = snapshot;
        }
    }

    /// Saves the current encounter, overwriting the saved slot it was loaded from.
    pub fn save(&mut self, notifier: &dyn Notifier) {
        if self.encounter.is_empty() {
            return;
        }

        let snapshot = self.encounter.snapshot();
        match self.provenance {
            Provenance::Saved(index) if index < self.saved.len() => {
                self.saved[index] = snapshot;
            }
            _ => {
                self.saved.push(snapshot);
                self.provenance = Provenance::Saved(self.saved.len() - 1);
            }
        }

        notifier.notify(Notification::new("Encounter saved").with_severity(Severity::Success));
    }

    /// Replaces the current encounter with `snapshot`.
    ///
    /// Returns `false`, leaving everything untouched, if none of its monsters still exist.
    fn load(&mut self, ctx: &mut EncounterContext<'_>, snapshot: &EncounterSnapshot) -> bool {
        let encounter = Encounter::from_snapshot(snapshot, ctx.catalog);
        if encounter.is_empty() {
            log::warn!("None of the monsters in the loaded encounter exist any more");
            return false;
        }

        ctx.party.ensure_group();
        self.encounter = encounter;
        ctx.notifier
            .notify(Notification::new("Encounter loaded").with_body(self.encounter.summary()));
        true
    }

    /// Loads history entry `index`, moving it to the end of the history.
    ///
    /// Returns `false` when none of the entry's monsters exist any more.
    pub fn load_from_history(&mut self, ctx: &mut EncounterContext<'_>, index: usize) -> EncounterResult<bool> {
        check_index(index, self.history.len())?;

        let snapshot = self.history[index].clone();
        if !self.load(ctx, &snapshot) {
            return Ok(false);
        }

        self.provenance = Provenance::History;
        let entry = self.history.remove(index);
        self.history.push(entry);
        Ok(true)
    }

    /// Loads saved encounter `index`.
    ///
    /// Returns `false` when none of the saved monsters exist any more.
    pub fn load_from_saved(&mut self, ctx: &mut EncounterContext<'_>, index: usize) -> EncounterResult<bool> {
        check_index(index, self.saved.len())?;

        let snapshot = self.saved[index].clone();
        if !self.load(ctx, &snapshot) {
            return Ok(false);
        }

        self.provenance = Provenance::Saved(index);
        Ok(true)
    }

    /// Deletes saved encounter `index`, clearing the display if it was showing it.
    pub fn delete_saved(&mut self, notifier: &dyn Notifier, index: usize) -> EncounterResult<()> {
        check_index(index, self.saved.len())?;

        match self.provenance {
            Provenance::Saved(loaded) if loaded == index => self.clear(),
            Provenance::Saved(loaded) if loaded > index => {
                self.provenance = Provenance::Saved(loaded - 1);
            }
            _ => {}
        }

        self.saved.remove(index);
        notifier.notify(Notification::new("Encounter deleted"));
        Ok(())
    }

    /// Empties the current encounter. History and saved encounters are kept.
    pub fn clear(&mut self) {
        self.encounter = Encounter::default();
        self.provenance = Provenance::Fresh;
    }

    pub fn total_exp(&self, party: &Party) -> u32 {
        self.encounter.total_exp(party.level())
    }

    pub fn total_monsters(&self) -> u32 {
        self.encounter.total_monsters()
    }

    /// Difficulty label of the current encounter.
    pub fn actual_difficulty(&self, party: &Party) -> DifficultyRating {
        classify(self.total_exp(party), &party.experience)
    }

    /// Narrative difficulty label; empty when nobody in the party gains experience.
    pub fn difficulty_feel<R: Rng + ?Sized>(&self, party: &Party, rng: &mut R) -> String {
        if party.total_players() == 0 {
            return String::new();
        }
        difficulty_feel(self.total_exp(party), &party.experience.bands(), rng)
    }

    /// Threat thresholds for the party's size.
    pub fn threat(&self, party: &Party) -> ThreatThresholds {
        threat_thresholds(party.total_players(), party.experience.medium, &party.experience)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;
    use crate::encounter::{MonsterRef, SnapshotGroup};
    use crate::{CatalogFilter, DifficultyThresholds, MonsterAttributes};
    use rand::SeedableRng;

    struct Fixture {
        party: Party,
        catalog: MonsterCatalog,
        filters: Filters,
        notifier: RecordingNotifier,
        config: GenerationConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let records = (-1..=10)
                .flat_map(|level| {
                    ["Ghoul", "Wight", "Bandit"].into_iter().map(move |name| MonsterAttributes {
                        name: format!("{} {}", name, level),
                        level,
                        source: "Test".to_string(),
                        ..Default::default()
                    })
                })
                .collect();

            Self {
                party: Party::new(4, 5, DifficultyThresholds::new(250, 500, 750, 1100)),
                catalog: MonsterCatalog::from_attributes(records),
                filters: Filters::default(),
                notifier: RecordingNotifier::new(),
                config: GenerationConfig::for_testing(0),
            }
        }

        fn ctx(&mut self) -> EncounterContext<'_> {
            EncounterContext {
                party: &mut self.party,
                catalog: &self.catalog,
                filters: &self.filters,
                notifier: &self.notifier,
                config: &self.config,
            }
        }

        fn monster(&self, slug: &str) -> Arc<Monster> {
            self.catalog.lookup(slug).unwrap()
        }
    }

    #[test]
    fn test_generate_appends_history() {
        let mut fixture = Fixture::new();
        let mut state = EncounterState::new();
        let mut rng = StdRng::seed_from_u64(3);

        state.generate(&mut fixture.ctx(), &mut rng).unwrap();
        state.generate(&mut fixture.ctx(), &mut rng).unwrap();

        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history.last(), Some(&state.encounter.snapshot()));
        assert_eq!(state.total_monsters(), 4);
    }

    #[test]
    fn test_failed_generation_leaves_state_untouched() {
        let mut fixture = Fixture::new();
        let mut state = EncounterState::new();
        let mut rng = StdRng::seed_from_u64(3);
        state.generate(&mut fixture.ctx(), &mut rng).unwrap();
        let before = state.encounter.clone();

        fixture.filters = Filters::new(CatalogFilter {
            search: Some("nothing matches this".to_string()),
            ..Default::default()
        });
        let result = state.generate(&mut fixture.ctx(), &mut rng);

        assert!(matches!(result, Err(EncounterError::NoEligibleMonster)));
        assert_eq!(state.encounter, before);
        assert_eq!(state.history.len(), 1);
        assert_eq!(fixture.notifier.last().unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_missing_budget_is_silent() {
        let mut fixture = Fixture::new();
        fixture.party.experience.deadly = 0;
        let mut state = EncounterState::new();
        state.difficulty = Difficulty::Deadly;
        let mut rng = StdRng::seed_from_u64(3);

        let result = state.generate(&mut fixture.ctx(), &mut rng);
        assert!(matches!(result, Err(EncounterError::BudgetUnavailable(_))));
        assert!(state.history.is_empty());
        assert!(fixture.notifier.is_empty());
    }

    #[test]
    fn test_missing_budget_leaves_empty_party_alone() {
        let mut fixture = Fixture::new();
        fixture.party.groups.clear();
        fixture.party.experience.hard = 0;
        let mut state = EncounterState::new();
        state.difficulty = Difficulty::Hard;
        let mut rng = StdRng::seed_from_u64(3);

        let result = state.generate(&mut fixture.ctx(), &mut rng);
        assert!(matches!(result, Err(EncounterError::BudgetUnavailable(Difficulty::Hard))));
        assert!(fixture.party.groups.is_empty());
    }

    #[test]
    fn test_manual_edits_rewrite_latest_history_entry() {
        let mut fixture = Fixture::new();
        let mut state = EncounterState::new();
        let wight = fixture.monster("wight-3-test-3");

        state.add_monster(&mut fixture.ctx(), Arc::clone(&wight));
        state.add_monster(&mut fixture.ctx(), wight);
        state.increment(0).unwrap();

        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].slug_counts(), vec![("wight-3-test-3".to_string(), 3)]);
    }

    #[test]
    fn test_decrement_removes_group_and_pops_history() {
        let mut fixture = Fixture::new();
        let mut state = EncounterState::new();
        let monster = fixture.monster("ghoul-1-test-1");
        state.add_monster(&mut fixture.ctx(), monster);
        assert_eq!(state.history.len(), 1);

        state.decrement(0).unwrap();
        assert!(state.encounter.is_empty());
        assert!(state.history.is_empty());
        assert!(matches!(
            state.decrement(0),
            Err(EncounterError::InvalidIndex { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_add_monster_to_empty_party() {
        let mut fixture = Fixture::new();
        fixture.party.groups.clear();
        let mut state = EncounterState::new();

        let monster = fixture.monster("ghoul-1-test-1");
        state.add_monster(&mut fixture.ctx(), monster);
        assert_eq!(fixture.party.groups.len(), 1);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let mut fixture = Fixture::new();
        let mut state = EncounterState::new();
        let mut rng = StdRng::seed_from_u64(5);
        state.generate(&mut fixture.ctx(), &mut rng).unwrap();
        let expected = state.encounter.snapshot().slug_counts();

        state.save(&fixture.notifier);
        assert_eq!(state.loaded_index(), Some(0));

        state.clear();
        assert!(state.encounter.is_empty());

        assert!(state.load_from_saved(&mut fixture.ctx(), 0).unwrap());
        assert_eq!(state.encounter.snapshot().slug_counts(), expected);
        assert_eq!(fixture.notifier.last().unwrap().title, "Encounter loaded");
    }

    #[test]
    fn test_save_overwrites_loaded_slot() {
        let mut fixture = Fixture::new();
        let mut state = EncounterState::new();
        let monster = fixture.monster("ghoul-1-test-1");
        state.add_monster(&mut fixture.ctx(), monster);
        state.save(&fixture.notifier);

        state.increment(0).unwrap();
        state.save(&fixture.notifier);

        assert_eq!(state.saved.len(), 1);
        assert_eq!(state.saved[0].groups[0].count, 2);
    }

    #[test]
    fn test_save_empty_is_noop() {
        let fixture = Fixture::new();
        let mut state = EncounterState::new();
        state.save(&fixture.notifier);
        assert!(state.saved.is_empty());
        assert!(fixture.notifier.is_empty());
    }

    #[test]
    fn test_load_from_history_moves_entry_to_end() {
        let mut fixture = Fixture::new();
        let mut state = EncounterState::new();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..3 {
            state.generate(&mut fixture.ctx(), &mut rng).unwrap();
        }
        let first = state.history[0].clone();

        assert!(state.load_from_history(&mut fixture.ctx(), 0).unwrap());

        assert_eq!(state.history.len(), 3);
        assert_eq!(state.history[2], first);
        assert_eq!(state.encounter.snapshot(), first);
        assert!(state.loaded_last());
        assert_eq!(state.loaded_index(), None);
    }

    #[test]
    fn test_loading_only_stale_monsters_is_noop() {
        let mut fixture = Fixture::new();
        let mut state = EncounterState::new();
        let monster = fixture.monster("bandit-2-test-2");
        state.add_monster(&mut fixture.ctx(), monster);
        state.saved.push(EncounterSnapshot {
            groups: vec![SnapshotGroup {
                monster: MonsterRef {
                    name: "Retired".to_string(),
                    slug: "retired-test-4".to_string(),
                },
                count: 2,
            }],
        });

        let notified = fixture.notifier.len();
        assert!(!state.load_from_saved(&mut fixture.ctx(), 0).unwrap());
        assert_eq!(state.encounter.groups[0].monster.slug, "bandit-2-test-2");
        assert_eq!(state.provenance, Provenance::Fresh);
        assert_eq!(fixture.notifier.len(), notified);

        // Saving afterwards must append rather than overwrite the stale slot.
        state.save(&fixture.notifier);
        assert_eq!(state.saved.len(), 2);
        assert_eq!(state.saved[0].groups[0].monster.slug, "retired-test-4");
        assert_eq!(state.loaded_index(), Some(1));
    }

    #[test]
    fn test_loading_stale_history_entry_keeps_order() {
        let mut fixture = Fixture::new();
        let mut state = EncounterState::new();
        let mut rng = StdRng::seed_from_u64(5);
        state.history.push(EncounterSnapshot {
            groups: vec![SnapshotGroup {
                monster: MonsterRef {
                    name: "Retired".to_string(),
                    slug: "retired-test-4".to_string(),
                },
                count: 1,
            }],
        });
        state.generate(&mut fixture.ctx(), &mut rng).unwrap();
        let before = state.history.clone();

        assert!(!state.load_from_history(&mut fixture.ctx(), 0).unwrap());
        assert_eq!(state.history, before);
        assert!(!state.loaded_last());
        assert_eq!(state.encounter.snapshot(), before[1]);
    }

    #[test]
    fn test_delete_saved_adjusts_loaded_index() {
        let mut fixture = Fixture::new();
        let mut state = EncounterState::new();
        for slug in ["ghoul-1-test-1", "wight-2-test-2", "bandit-3-test-3"] {
            state.clear();
            let monster = fixture.monster(slug);
            state.add_monster(&mut fixture.ctx(), monster);
            state.save(&fixture.notifier);
        }
        assert_eq!(state.loaded_index(), Some(2));

        state.delete_saved(&fixture.notifier, 0).unwrap();
        assert_eq!(state.loaded_index(), Some(1));
        assert_eq!(state.encounter.groups[0].monster.slug, "bandit-3-test-3");

        state.delete_saved(&fixture.notifier, 1).unwrap();
        assert!(state.encounter.is_empty());
        assert_eq!(state.loaded_index(), None);
        assert_eq!(state.saved.len(), 1);
        assert_eq!(fixture.notifier.last().unwrap().title, "Encounter deleted");
    }

    #[test]
    fn test_reroll_keeps_cr_and_avoids_duplicates() {
        let mut fixture = Fixture::new();
        let mut state = EncounterState::new();
        let mut rng = StdRng::seed_from_u64(2);
        let monster = fixture.monster("ghoul-4-test-4");
        state.add_monster(&mut fixture.ctx(), monster);
        let monster = fixture.monster("wight-4-test-4");
        state.add_monster(&mut fixture.ctx(), monster);

        assert!(state.reroll(&fixture.ctx(), 0, &mut rng).unwrap());
        assert_eq!(state.encounter.groups[0].monster.slug, "bandit-4-test-4");
        assert_eq!(state.encounter.groups[0].monster.cr.numeric, 4);

        // Every CR 4 monster is now in the encounter.
        let ghoul = fixture.monster("ghoul-4-test-4");
        state.add_monster(&mut fixture.ctx(), ghoul);
        assert!(!state.reroll(&fixture.ctx(), 0, &mut rng).unwrap());
        assert!(matches!(
            state.reroll(&fixture.ctx(), 7, &mut rng),
            Err(EncounterError::InvalidIndex { index: 7, len: 3 })
        ));
    }

    #[test]
    fn test_views() {
        let mut fixture = Fixture::new();
        let mut state = EncounterState::new();
        let mut rng = StdRng::seed_from_u64(0);
        // Party level 5: CR 7 is worth 80.
        let ghoul = fixture.monster("ghoul-7-test-7");
        for _ in 0..4 {
            state.add_monster(&mut fixture.ctx(), Arc::clone(&ghoul));
        }

        assert_eq!(state.total_exp(&fixture.party), 320);
        assert_eq!(state.actual_difficulty(&fixture.party), DifficultyRating::Easy);
        assert_eq!(state.difficulty_feel(&fixture.party, &mut rng), "easy");
        assert_eq!(state.threat(&fixture.party).medium, 500);
    }

    #[test]
    fn test_persist_and_restore() {
        let mut fixture = Fixture::new();
        let mut state = EncounterState::new();
        let mut rng = StdRng::seed_from_u64(6);
        state.mode = "boss_minions".to_string();
        state.difficulty = Difficulty::Hard;
        state.generate(&mut fixture.ctx(), &mut rng).unwrap();
        state.save(&fixture.notifier);

        let mut store = MemoryStore::new();
        state.persist(&mut store).unwrap();
        let restored = EncounterState::restore(&mut store, &fixture.catalog).unwrap();

        assert_eq!(restored.encounter, state.encounter);
        assert_eq!(restored.history, state.history);
        assert_eq!(restored.saved, state.saved);
        assert_eq!(restored.loaded_index(), Some(0));
        assert_eq!(restored.difficulty, Difficulty::Hard);
        assert_eq!(restored.mode, "boss_minions");
    }

    #[test]
    fn test_restore_migrates_legacy_keys() {
        let fixture = Fixture::new();
        let mut store = MemoryStore::new();
        store
            .set("encounterGenerateType", serde_json::json!("boss_minions"))
            .unwrap();
        store
            .set("encounterDifficulty", serde_json::json!("deadly"))
            .unwrap();

        let state = EncounterState::restore(&mut store, &fixture.catalog).unwrap();
        assert_eq!(state.mode, "boss_minions");
        assert_eq!(state.difficulty, Difficulty::Deadly);
        assert!(store.get("encounterGenerateType").is_none());
        assert_eq!(store.get("encounterType"), Some(serde_json::json!("boss_minions")));
    }
}
