//! Shared type definitions for the team simulation.
//!
//! This crate is the single source of truth for the data model exchanged
//! between the turn engine, the narrative provider, and any front-end.
//! Types flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`enums`] -- Closed enumerations (personality, status, language, difficulty)
//! - [`structs`] -- Roster, stats, scenarios, provider results, game state
//! - [`contract`] -- Bounds and shape checks for provider payloads

pub mod contract;
pub mod enums;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use contract::{
    ContractViolation, DELTA_MAX, DELTA_MIN, MAX_CHOICES, MIN_CHOICES, STAT_MAX, STAT_MIN,
    check_scenario, check_turn_result, out_of_range_deltas,
};
pub use enums::{Difficulty, GameStatus, Language, Personality, UnknownVariant};
pub use structs::{Agent, Choice, Feedback, GameState, Scenario, StatChanges, TeamStats, TurnResult};
