//! Shape checks for data crossing the narrative provider boundary.
//!
//! A provider is free to return anything; these checks decide whether a
//! scenario or turn result is usable by the engine. Stat deltas are checked
//! separately from scenario shape because the engine tolerates oversized
//! deltas (it clamps the resulting stats) but cannot show a malformed scenario.

use std::collections::BTreeSet;

use crate::structs::{Agent, Scenario, StatChanges, TurnResult};

/// Lowest value a stat can hold.
pub const STAT_MIN: u8 = 0;
/// Highest value a stat can hold.
pub const STAT_MAX: u8 = 100;
/// Lowest per-turn delta a provider may report.
pub const DELTA_MIN: i32 = -20;
/// Highest per-turn delta a provider may report.
pub const DELTA_MAX: i32 = 20;
/// Fewest choices a scenario may offer.
pub const MIN_CHOICES: usize = 2;
/// Most choices a scenario may offer.
pub const MAX_CHOICES: usize = 3;

/// A provider payload that does not satisfy the contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    /// `agentInFocus` names nobody on the roster.
    #[error("agent in focus {name:?} is not on the team")]
    UnknownFocusAgent {
        /// The name the provider used.
        name: String,
    },

    /// The scenario offers too few or too many choices.
    #[error("scenario has {count} choices, expected {MIN_CHOICES}..={MAX_CHOICES}")]
    ChoiceCount {
        /// Number of choices received.
        count: usize,
    },

    /// Two choices share an id.
    #[error("duplicate choice id {id}")]
    DuplicateChoiceId {
        /// The repeated id.
        id: u32,
    },

    /// A required text field is blank.
    #[error("field {field} is empty")]
    EmptyField {
        /// Name of the blank field.
        field: &'static str,
    },

    /// A stat delta lies outside `[DELTA_MIN, DELTA_MAX]`.
    #[error("{stat} delta {value} outside {DELTA_MIN}..={DELTA_MAX}")]
    DeltaOutOfRange {
        /// Which stat.
        stat: &'static str,
        /// The reported delta.
        value: i32,
    },
}

/// Check that a scenario can be presented to the player.
///
/// # Errors
///
/// Returns the first [`ContractViolation`] found.
pub fn check_scenario(scenario: &Scenario, team: &[Agent]) -> Result<(), ContractViolation> {
    if scenario.title.trim().is_empty() {
        return Err(ContractViolation::EmptyField { field: "title" });
    }
    if !team.iter().any(|a| a.name == scenario.agent_in_focus) {
        return Err(ContractViolation::UnknownFocusAgent {
            name: scenario.agent_in_focus.clone(),
        });
    }

    let count = scenario.choices.len();
    if !(MIN_CHOICES..=MAX_CHOICES).contains(&count) {
        return Err(ContractViolation::ChoiceCount { count });
    }

    let mut seen = BTreeSet::new();
    for choice in &scenario.choices {
        if !seen.insert(choice.id) {
            return Err(ContractViolation::DuplicateChoiceId { id: choice.id });
        }
        if choice.text.trim().is_empty() {
            return Err(ContractViolation::EmptyField {
                field: "choices.text",
            });
        }
    }
    Ok(())
}

/// Every delta that falls outside the contractual range, by stat name.
pub fn out_of_range_deltas(changes: &StatChanges) -> Vec<ContractViolation> {
    [
        ("morale", changes.morale),
        ("productivity", changes.productivity),
        ("cooperation", changes.cooperation),
    ]
    .into_iter()
    .filter(|(_, value)| !(DELTA_MIN..=DELTA_MAX).contains(value))
    .map(|(stat, value)| ContractViolation::DeltaOutOfRange { stat, value })
    .collect()
}

/// Strict check of a whole turn result: scenario shape and delta bounds.
///
/// # Errors
///
/// Returns the first [`ContractViolation`] found.
pub fn check_turn_result(result: &TurnResult, team: &[Agent]) -> Result<(), ContractViolation> {
    check_scenario(&result.next_scenario, team)?;
    match out_of_range_deltas(&result.stat_changes).into_iter().next() {
        Some(violation) => Err(violation),
        None => Ok(()),
    }
}
