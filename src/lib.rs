//! # Eramud
//!
//! A single-player, text-driven exploration and combat game spread across
//! several "years" (eras) of a ruined world.
//!
//! ## Architecture Overview
//!
//! Eramud is organized around a deterministic simulation core:
//!
//! - **RNG Derivation**: reproducible random streams derived from the world
//!   seed plus contextual tags, so content and AI decisions replay identically
//! - **World Store**: per-era grids, ground item stacks, and monster lists
//! - **Generation System**: seeded item/monster targets with idempotent top-up
//! - **Monster AI**: dormant/aggro state machine with greedy pursuit
//! - **Combat**: damage resolution and the ordered death/loot pipeline
//! - **Macro Engine**: a small expansion language for scripting player input
//!
//! The line dispatcher and terminal rendering are thin glue around the core;
//! everything the core returns is plain data.

pub mod ai;
pub mod combat;
pub mod game;
pub mod generation;
pub mod input;
pub mod rng;
pub mod script;
pub mod utils;
pub mod world;

// Core module re-exports
pub use ai::*;
pub use combat::*;
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rng::*;
pub use script::*;
pub use world::*;

/// Core error type for the Eramud game engine.
#[derive(thiserror::Error, Debug)]
pub enum EramudError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// A script expanded past the hard command cap
    #[error("Script aborted: expansion exceeded {0} commands")]
    ScriptStepLimit(usize),

    /// Macro calls or repetition groups nested too deeply
    #[error("Script aborted: recursion deeper than {0} levels")]
    ScriptRecursion(usize),
}

/// Result type used throughout the Eramud codebase.
pub type EramudResult<T> = Result<T, EramudError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Inclusive lower bound of both grid axes
    pub const GRID_MIN: i32 = -15;

    /// Exclusive upper bound of both grid axes
    pub const GRID_MAX: i32 = 15;

    /// Mean ground-item target per era
    pub const ITEM_TARGET_MEAN: u32 = 400;

    /// Spread around the item target mean (fraction of the mean)
    pub const ITEM_TARGET_SPREAD: f64 = 0.10;

    /// Monsters seeded per walkable tile
    pub const MONSTER_SPAWN_RATE: f64 = 0.03;

    /// Chance a dormant monster wakes when the player enters its tile
    pub const AGGRO_CHANCE: f64 = 0.5;

    /// Maximum item instances a single ground tile can hold
    pub const MAX_ITEMS_PER_TILE: usize = 10;

    /// Maximum items a dying monster can shed
    pub const MAX_DROPS_PER_DEATH: usize = 6;

    /// Armor class points per point of damage mitigated
    pub const AC_DIVISOR: i32 = 10;

    /// Hard cap on expanded commands per script invocation
    pub const MACRO_STEP_LIMIT: usize = 1000;

    /// Maximum nesting depth for repetition groups and macro calls
    pub const MACRO_DEPTH_LIMIT: usize = 8;

    /// Longest sleep a script `wait` may request, in milliseconds
    pub const MACRO_WAIT_CAP_MS: u64 = 2000;

    /// Length of one upkeep tick in seconds
    pub const UPKEEP_TICK_SECS: u64 = 10;

    /// Background ticker poll interval in milliseconds
    pub const UPKEEP_POLL_MS: u64 = 1000;

    /// Most upkeep ticks processed after a long idle period
    pub const MAX_CATCHUP_TICKS: u32 = 6;

    /// Full sustenance for a freshly fed player
    pub const MAX_SUSTENANCE: i32 = 100;

    /// Era new characters start in
    pub const DEFAULT_YEAR: i32 = 2000;
}
