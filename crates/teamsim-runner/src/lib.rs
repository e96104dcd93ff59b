//! LLM-backed narrative service and terminal front-end for the team simulation.
//!
//! The runner implements [`teamsim_core::NarrativeProvider`] over an HTTP
//! LLM, keeps the player's credential on disk, and drives a game from the
//! terminal.
//!
//! # Architecture
//!
//! ```text
//! TurnEngine --> NarrativeService --> Prompt Engine --> LLM Backend --> Parser
//!                     ^
//!                     |
//!               Session (credential store)
//! ```
//!
//! If the LLM fails, times out, or returns something unusable, the service
//! reports an error and the engine substitutes its fallback, so the player
//! never gets stuck.
//!
//! # Modules
//!
//! - [`config`] -- Environment configuration and backend selection.
//! - [`credentials`] -- Credential validation and file storage.
//! - [`error`] -- [`RunnerError`](error::RunnerError).
//! - [`llm`] -- Gemini, OpenAI-compatible, and Anthropic backends.
//! - [`parse`] -- Response recovery, repair, and contract checks.
//! - [`prompt`] -- `minijinja` prompt templates.
//! - [`service`] -- [`NarrativeService`](service::NarrativeService).
//! - [`session`] -- Credential lifecycle glue.
//! - [`terminal`] -- Text rendering for the `teamsim` binary.

pub mod config;
pub mod credentials;
pub mod error;
pub mod llm;
pub mod parse;
pub mod prompt;
pub mod service;
pub mod session;
pub mod terminal;

pub use config::{BackendType, RunnerConfig};
pub use credentials::CredentialStore;
pub use error::RunnerError;
pub use service::NarrativeService;
pub use session::Session;
