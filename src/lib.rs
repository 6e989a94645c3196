//! # Encounterforge
//!
//! An encounter-building assistant for tabletop role-playing games.
//!
//! ## Architecture Overview
//!
//! Given a party and a target difficulty, Encounterforge selects a composition of
//! monsters whose combined experience value matches the party's experience budget.
//! The core concepts are:
//!
//! - **Experience Table**: step function from party level and monster CR to experience
//! - **Budget Matcher**: nearest-CR search with a down-then-up widening fallback
//! - **Template Resolver**: group-count/ratio templates with symbolic group sizes
//! - **Generation Engine**: orchestrates the above and commits encounters atomically
//! - **Encounter State**: history, saved encounters and the derived difficulty views
//!
//! Every collaborator (party, monster catalog, filters, notifications, storage) is
//! passed in explicitly; nothing in the crate reaches for global state.

pub mod encounter;
pub mod generation;
pub mod monsters;
pub mod notify;
pub mod party;
pub mod storage;

pub use encounter::*;
pub use generation::*;
pub use monsters::*;
pub use notify::*;
pub use party::*;
pub use storage::*;

/// Core error type for the Encounterforge engine.
#[derive(thiserror::Error, Debug)]
pub enum EncounterError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The party has no experience budget for the requested difficulty
    #[error("No experience budget defined for {0} difficulty")]
    BudgetUnavailable(Difficulty),

    /// Widening search ran out of challenge ratings for some group
    #[error("No eligible monsters under current filters")]
    NoEligibleMonster,

    /// An encounter template is malformed
    #[error("Invalid encounter template: {0}")]
    InvalidTemplate(String),

    /// A symbolic group count could not be evaluated
    #[error("Invalid count expression: {0}")]
    Expression(String),

    /// No template mode with this name is registered
    #[error("Unknown encounter mode: {0}")]
    UnknownMode(String),

    /// No monster with this slug exists in the catalog
    #[error("Unknown monster: {0}")]
    UnknownMonster(String),

    /// A group, history or saved index was out of range
    #[error("Index {index} out of range (length {len})")]
    InvalidIndex { index: usize, len: usize },

    /// State is inconsistent
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type used throughout the Encounterforge codebase.
pub type EncounterResult<T> = Result<T, EncounterError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine configuration constants.
pub mod config {
    /// Multiplier applied once to the difficulty threshold to form the budget.
    /// The matcher spends conservatively, so this pulls totals back toward the target.
    pub const BUDGET_FACTOR: f64 = 1.1;

    /// Lowest challenge rating in the catalog
    pub const MIN_CR: i32 = -1;

    /// Highest challenge rating in the catalog
    pub const MAX_CR: i32 = 30;

    /// Difficulty selected when nothing has been persisted yet
    pub const DEFAULT_DIFFICULTY: &str = "medium";

    /// Template mode selected when nothing has been persisted yet
    pub const DEFAULT_MODE: &str = "random";

    /// Players in the group created when the party is empty
    pub const DEFAULT_GROUP_PLAYERS: u32 = 4;

    /// Level of the group created when the party is empty
    pub const DEFAULT_GROUP_LEVEL: i32 = 1;
}
