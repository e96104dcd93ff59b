//! Core data model: roster, stats, scenarios, provider results, game state.
//!
//! Field names on the wire are camelCase so the same JSON shape is used by
//! the narrative provider's responses and by exported `TypeScript` bindings.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Difficulty, GameStatus, Language, Personality};

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// A member of the player's team.
///
/// `name` is the identity key: it is unique within a roster and is what a
/// [`Scenario::agent_in_focus`] refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Agent {
    /// Display name, unique within the roster.
    pub name: String,
    /// Working style.
    pub personality: Personality,
    /// Avatar image URL (display only).
    pub avatar_url: String,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// The three team stats, each held in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TeamStats {
    /// How motivated the team feels.
    pub morale: u8,
    /// How much work is getting done.
    pub productivity: u8,
    /// How well the team works together.
    pub cooperation: u8,
}

/// Signed per-turn deltas for each stat.
///
/// The provider contract bounds each delta to `[-20, 20]`; the engine does
/// not rely on that and clamps the resulting stats instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatChanges {
    /// Change to morale.
    pub morale: i32,
    /// Change to productivity.
    pub productivity: i32,
    /// Change to cooperation.
    pub cooperation: i32,
}

impl StatChanges {
    /// The same delta applied to all three stats.
    pub const fn uniform(delta: i32) -> Self {
        Self {
            morale: delta,
            productivity: delta,
            cooperation: delta,
        }
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// One action the player can take in a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Choice {
    /// Identifier, unique within the owning scenario.
    pub id: u32,
    /// Label shown to the player.
    pub text: String,
}

/// A single narrative beat awaiting a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Scenario {
    /// Short title.
    pub title: String,
    /// Free-text situation description.
    pub description: String,
    /// Name of the roster agent this scenario centres on.
    pub agent_in_focus: String,
    /// Two or three choices, in display order.
    pub choices: Vec<Choice>,
}

impl Scenario {
    /// Look up a choice by its id.
    pub fn choice(&self, id: u32) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }
}

// ---------------------------------------------------------------------------
// Provider result
// ---------------------------------------------------------------------------

/// The narrative provider's answer to a player choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TurnResult {
    /// Short assessment of the player's decision.
    pub feedback: String,
    /// In-character reaction from the team.
    pub agent_response: String,
    /// Stat deltas caused by the decision.
    pub stat_changes: StatChanges,
    /// The scenario that follows.
    pub next_scenario: Scenario,
    /// Whether the provider considers this the last scenario of the game.
    pub is_final_scenario: bool,
}

// ---------------------------------------------------------------------------
// Game state
// ---------------------------------------------------------------------------

/// Display payload shown while the game is in [`GameStatus::ShowFeedback`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Feedback {
    /// Agent reaction followed by the provider's feedback text.
    pub message: String,
    /// The deltas exactly as reported, before clamping.
    pub stat_changes: StatChanges,
}

/// The authoritative state of one game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GameState {
    /// Current lifecycle status.
    pub status: GameStatus,
    /// The fixed roster.
    pub team: Vec<Agent>,
    /// Current stats.
    pub stats: TeamStats,
    /// The scenario awaiting a decision, if one has been fetched.
    pub current_scenario: Option<Scenario>,
    /// 1-based turn counter; 0 before the game starts.
    pub turn: u32,
    /// Feedback overlay payload, present only while showing feedback.
    pub feedback: Option<Feedback>,
    /// Selected language.
    pub language: Language,
    /// Selected difficulty.
    pub difficulty: Difficulty,
}
