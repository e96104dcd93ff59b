//! Enumeration types for the team simulation.
//!
//! Every enumeration here is closed: the provider contract, the prompt
//! templates, and the fallback text tables all match on these exhaustively.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Personality
// ---------------------------------------------------------------------------

/// The working style of a team member.
///
/// Serialized by variant name (`"Leader"`, `"Analyst"`, ...) because the
/// names are also fed verbatim into provider prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Personality {
    /// Decisive, drives the team forward.
    Leader,
    /// Careful, data-driven.
    Analyst,
    /// Idea-generator.
    Creative,
    /// Keeps the peace.
    Collaborator,
}

impl Personality {
    /// All personalities in roster order.
    pub const ALL: [Self; 4] = [
        Self::Leader,
        Self::Analyst,
        Self::Creative,
        Self::Collaborator,
    ];

    /// One-line trait description handed to the narrative provider.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Leader => {
                "Decisive and action-oriented, but can sometimes overlook details."
            }
            Self::Analyst => {
                "Meticulous and data-driven, but may suffer from analysis paralysis."
            }
            Self::Creative => "Innovative and full of ideas, but can be disorganized.",
            Self::Collaborator => {
                "A great team player who fosters harmony, but may avoid conflict."
            }
        }
    }

    /// The variant name as it appears on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leader => "Leader",
            Self::Analyst => "Analyst",
            Self::Creative => "Creative",
            Self::Collaborator => "Collaborator",
        }
    }
}

impl core::fmt::Display for Personality {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Game status
// ---------------------------------------------------------------------------

/// Lifecycle status of a game session.
///
/// ```text
/// StartScreen -> InProgress -> ShowFeedback -> InProgress | EndScreen
/// EndScreen   -> StartScreen (restart only)
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum GameStatus {
    /// No game running; waiting for the player to pick options.
    #[default]
    StartScreen,
    /// A scenario is (or is about to be) shown and awaits a choice.
    InProgress,
    /// The outcome of the last choice is being displayed.
    ShowFeedback,
    /// The game is over.
    EndScreen,
}

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Language for every narrative string and user-facing message.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Language {
    /// English.
    #[default]
    En,
    /// Korean.
    Ko,
}

impl Language {
    /// The short code used on the wire (`"en"` / `"ko"`).
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ko => "ko",
        }
    }

    /// The English name of the language, as used in provider instructions.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Ko => "Korean",
        }
    }
}

impl core::str::FromStr for Language {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "ko" | "korean" => Ok(Self::Ko),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Difficulty selected at game start. Only seeds initial cooperation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Difficulty {
    /// Cooperation starts high.
    Easy,
    /// Balanced start.
    #[default]
    Normal,
    /// Cooperation starts low.
    Hard,
}

impl core::str::FromStr for Difficulty {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

/// A string did not name any variant of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);
