//! # Storage Module
//!
//! Named JSON values that survive restarts, with one-time renaming of legacy keys.

use crate::EncounterResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Storage of named JSON values.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Value) -> EncounterResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> EncounterResult<()>;

    /// Returns the value under `key` deserialized as `T`, or `None` if missing or malformed.
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T>
    where
        Self: Sized,
    {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::warn!("Ignoring malformed stored value for {}: {}", key, e);
                None
            }
        }
    }

    /// Serializes `value` and stores it under `key`.
    fn set_as<T: Serialize>(&mut self, key: &str, value: &T) -> EncounterResult<()>
    where
        Self: Sized,
    {
        self.set(key, serde_json::to_value(value)?)
    }
}

/// Reads `key`, first moving a value stored under `legacy_key` over if `key` is absent.
///
/// Returns `default` when neither key holds a usable value.
///
/// # Examples
///
/// ```
/// use encounterforge::{migrate, KeyValueStore, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// store.set("encounterDifficulty", serde_json::json!("hard")).unwrap();
///
/// let difficulty: String = migrate(&mut store, "encounterDifficulty", "difficulty", "medium".to_string()).unwrap();
/// assert_eq!(difficulty, "hard");
/// assert!(store.get("encounterDifficulty").is_none());
/// assert!(store.get("difficulty").is_some());
/// ```
pub fn migrate<S, T>(store: &mut S, legacy_key: &str, key: &str, default: T) -> EncounterResult<T>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    if store.get(key).is_none() {
        if let Some(legacy) = store.get(legacy_key) {
            log::info!("Migrating stored value {} to {}", legacy_key, key);
            store.set(key, legacy)?;
            store.remove(legacy_key)?;
        }
    }

    Ok(store.get_as(key).unwrap_or(default))
}

/// In-memory store, used by tests and as a scratch store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> EncounterResult<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> EncounterResult<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk. Every write rewrites the file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> EncounterResult<Self> {
        let path = path.into();
        let values = if path.exists() {
            let json = std::fs::read_to_string(&path)?;
            if json.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&json)?
            }
        } else {
            log::debug!("No state file at {}, starting empty", path.display());
            Map::new()
        };

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> EncounterResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> EncounterResult<()> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> EncounterResult<()> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
