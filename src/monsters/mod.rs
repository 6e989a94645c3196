//! # Monsters Module
//!
//! The monster record, its challenge rating, and the catalog monsters are drawn from.
//!
//! Monsters are loaded from raw attribute records (the shape of the bestiary JSON),
//! turned into [`Monster`] values with a stable slug, and shared through the
//! [`MonsterCatalog`] as `Arc<Monster>` so encounters can hold cheap references.

pub mod experience;
pub mod filters;

pub use experience::*;
pub use filters::*;

use crate::EncounterResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Size traits, smallest first. The first trait of a monster found here is its size.
const SIZE_TRAITS: [&str; 6] = ["tiny", "small", "medium", "large", "huge", "gargantuan"];

/// Raw monster record as it appears in a bestiary file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterAttributes {
    pub name: String,
    /// Challenge rating (creature level)
    pub level: i32,
    #[serde(rename = "type")]
    pub creature_type: String,
    pub traits: Vec<String>,
    pub hp: Option<u32>,
    pub unique: bool,
    #[serde(rename = "unique?")]
    pub unique_flag: bool,
    pub lair: bool,
    #[serde(rename = "lair?")]
    pub lair_flag: bool,
    pub special: bool,
    pub legendary: bool,
    /// Comma separated tag list
    pub tags: Option<String>,
    pub alignment: Option<String>,
    pub section: Option<String>,
    pub source: String,
    pub page: Option<serde_json::Value>,
}

/// A monster's challenge rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRating {
    /// Numeric tier, from [`MIN_CR`] to [`MAX_CR`]
    pub numeric: i32,
    /// Display form of the tier
    pub string: String,
}

impl ChallengeRating {
    pub fn new(numeric: i32) -> Self {
        Self {
            numeric,
            string: numeric.to_string(),
        }
    }
}

/// A monster available for encounters.
///
/// The experience value is deliberately not stored here; use
/// [`experience_of`] with the current party level.
#[derive(Debug, Clone, PartialEq)]
pub struct Monster {
    pub name: String,
    /// Stable identifier used to re-resolve persisted encounters
    pub slug: String,
    pub cr: ChallengeRating,
    pub creature_type: String,
    pub size: Option<String>,
    pub hp: Option<u32>,
    pub is_unique: bool,
    pub lair: bool,
    pub special: bool,
    pub legendary: bool,
    /// Sorted tag list
    pub tags: Vec<String>,
    pub alignment: Option<String>,
    /// Source citations, e.g. "Bestiary page 12"
    pub sources: Vec<String>,
    /// Lowercase `|`-joined text used by search filters
    pub searchable: String,
}

impl Monster {
    /// Builds a monster from its raw bestiary record.
    ///
    /// # Examples
    ///
    /// ```
    /// use encounterforge::{Monster, MonsterAttributes};
    ///
    /// let monster = Monster::from_attributes(MonsterAttributes {
    ///     name: "Cave Bear".to_string(),
    ///     level: 3,
    ///     source: "Bestiary".to_string(),
    ///     ..Default::default()
    /// });
    /// assert_eq!(monster.slug, "cave-bear-bestiary-3");
    /// assert!(!monster.is_unique);
    /// ```
    pub fn from_attributes(attributes: MonsterAttributes) -> Self {
        let cr = ChallengeRating::new(attributes.level);
        let slug = slugify(&format!(
            "{}-{}-{}",
            attributes.name, attributes.source, cr.string
        ));

        let size = attributes
            .traits
            .iter()
            .find(|t| SIZE_TRAITS.contains(&t.to_lowercase().as_str()))
            .map(|t| t.to_lowercase());

        let mut tags: Vec<String> = attributes
            .tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        tags.sort();

        let page = match &attributes.page {
            Some(serde_json::Value::String(page)) => page.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let sources = if page.is_empty() {
            vec![attributes.source.clone()]
        } else {
            vec![format!("{} page {}", attributes.source, page)]
        };

        let searchable = [
            attributes.name.as_str(),
            attributes.section.as_deref().unwrap_or(""),
            attributes.creature_type.as_str(),
            size.as_deref().unwrap_or(""),
            attributes.alignment.as_deref().unwrap_or(""),
            cr.string.as_str(),
        ]
        .into_iter()
        .chain(tags.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join("|")
        .to_lowercase();

        Self {
            name: attributes.name,
            slug,
            cr,
            creature_type: attributes.creature_type,
            size,
            hp: attributes.hp,
            is_unique: attributes.unique_flag || attributes.unique,
            lair: attributes.lair || attributes.lair_flag,
            special: attributes.special,
            legendary: attributes.legendary,
            tags,
            alignment: attributes.alignment,
            sources,
            searchable,
        }
    }
}

/// Lowercases `text` and replaces every run of non-alphanumeric characters with a single `-`.
///
/// # Examples
///
/// ```
/// use encounterforge::slugify;
///
/// assert_eq!(slugify("Ogre Warrior - Bestiary 2 - 3"), "ogre-warrior-bestiary-2-3");
/// assert_eq!(slugify("Goblin-Bestiary--1"), "goblin-bestiary-1");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// The set of monsters encounters are built from.
#[derive(Debug, Clone, Default)]
pub struct MonsterCatalog {
    monsters: Vec<Arc<Monster>>,
    by_slug: HashMap<String, Arc<Monster>>,
}

impl MonsterCatalog {
    /// Creates a catalog from monsters. Later monsters with an already seen slug are skipped.
    pub fn new(monsters: Vec<Monster>) -> Self {
        let mut catalog = Self::default();
        for monster in monsters {
            if catalog.by_slug.contains_key(&monster.slug) {
                log::warn!("Skipping duplicate monster slug {}", monster.slug);
                continue;
            }
            let monster = Arc::new(monster);
            catalog
                .by_slug
                .insert(monster.slug.clone(), Arc::clone(&monster));
            catalog.monsters.push(monster);
        }
        catalog
    }

    /// Creates a catalog from raw bestiary records.
    pub fn from_attributes(records: Vec<MonsterAttributes>) -> Self {
        Self::new(records.into_iter().map(Monster::from_attributes).collect())
    }

    /// Parses a JSON array of bestiary records.
    pub fn from_json(json: &str) -> EncounterResult<Self> {
        let records: Vec<MonsterAttributes> = serde_json::from_str(json)?;
        Ok(Self::from_attributes(records))
    }

    /// Reads and parses a bestiary file.
    pub fn load(path: impl AsRef<Path>) -> EncounterResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json(&json)?;
        log::info!(
            "Loaded {} monsters from {}",
            catalog.len(),
            path.as_ref().display()
        );
        Ok(catalog)
    }

    /// Returns every monster matching `criteria` and accepted by `predicate`, in catalog order.
    pub fn filter_by<F>(&self, criteria: &CatalogFilter, predicate: F) -> Vec<Arc<Monster>>
    where
        F: Fn(&Monster) -> bool,
    {
        self.monsters
            .iter()
            .filter(|monster| criteria.matches(monster) && predicate(monster))
            .cloned()
            .collect()
    }

    /// Finds a monster by slug.
    pub fn lookup(&self, slug: &str) -> Option<Arc<Monster>> {
        self.by_slug.get(slug).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Monster>> {
        self.monsters.iter()
    }

    pub fn len(&self) -> usize {
        self.monsters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monsters.is_empty()
    }
}
