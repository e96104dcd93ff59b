//! Turn engine for the team management simulation.
//!
//! This crate owns the game's state machine and the contract it holds with
//! whatever produces narrative content.
//!
//! # Modules
//!
//! - [`config`] -- Engine tunables and YAML loading.
//! - [`engine`] -- [`TurnEngine`]: start, submit a choice, restart.
//! - [`fallback`] -- Canned scenarios used when the provider fails.
//! - [`outcome`] -- End-of-game verdict from the final stats.
//! - [`provider`] -- [`NarrativeProvider`] trait and [`StubProvider`].
//! - [`roster`] -- The default team.
//! - [`stats`] -- Stat seeding and clamped arithmetic.
//!
//! [`TurnEngine`]: engine::TurnEngine
//! [`NarrativeProvider`]: provider::NarrativeProvider
//! [`StubProvider`]: provider::StubProvider

pub mod config;
pub mod engine;
pub mod fallback;
pub mod outcome;
pub mod provider;
pub mod roster;
pub mod stats;

pub use config::{ConfigError, EngineConfig};
pub use engine::{EngineView, IgnoreReason, StartOutcome, SubmitOutcome, TurnEngine};
pub use outcome::Outcome;
pub use provider::{NarrativeProvider, ProviderError, StubProvider, TurnRequest};
