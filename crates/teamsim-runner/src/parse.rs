//! LLM response parsing into typed scenarios and turn results.
//!
//! The LLM returns raw text (ideally JSON). This module extracts it into the
//! shared data model, repairs what can be repaired, and rejects the rest
//! so the engine falls back instead of showing a broken scenario.
//!
//! Repairs:
//! - `agentInFocus` matching a roster name up to case is rewritten to the
//!   roster spelling.
//! - Stat deltas outside `[-20, 20]` are clamped into range.

use serde::de::DeserializeOwned;
use teamsim_core::roster::find_agent;
use teamsim_types::{
    Agent, ContractViolation, DELTA_MAX, DELTA_MIN, Scenario, StatChanges, TurnResult,
    check_scenario, out_of_range_deltas,
};
use tracing::warn;

use crate::error::RunnerError;

/// Parse an opening scenario response.
///
/// # Errors
///
/// Returns [`RunnerError::Parse`] if no JSON object of the right shape can
/// be recovered, or [`RunnerError::Contract`] if the scenario is unusable.
pub fn parse_scenario(raw: &str, team: &[Agent]) -> Result<Scenario, RunnerError> {
    let mut scenario: Scenario = decode(raw)?;
    normalize_scenario(&mut scenario, team)?;
    Ok(scenario)
}

/// Parse a turn result response.
///
/// # Errors
///
/// Returns [`RunnerError::Parse`] if no JSON object of the right shape can
/// be recovered, or [`RunnerError::Contract`] if the next scenario is
/// unusable. Out-of-range deltas are clamped, not rejected.
pub fn parse_turn_result(raw: &str, team: &[Agent]) -> Result<TurnResult, RunnerError> {
    let mut result: TurnResult = decode(raw)?;
    normalize_scenario(&mut result.next_scenario, team)?;

    for violation in out_of_range_deltas(&result.stat_changes) {
        warn!(%violation, "clamping stat delta from LLM");
    }
    result.stat_changes = clamp_deltas(result.stat_changes);
    Ok(result)
}

/// Rewrite the focus agent to its roster spelling, then check the shape.
fn normalize_scenario(scenario: &mut Scenario, team: &[Agent]) -> Result<(), RunnerError> {
    let agent = find_agent(team, &scenario.agent_in_focus).ok_or_else(|| {
        ContractViolation::UnknownFocusAgent {
            name: scenario.agent_in_focus.clone(),
        }
    })?;
    if agent.name != scenario.agent_in_focus {
        scenario.agent_in_focus.clone_from(&agent.name);
    }
    check_scenario(scenario, team)?;
    Ok(())
}

/// Clamp every delta into `[DELTA_MIN, DELTA_MAX]`.
fn clamp_deltas(changes: StatChanges) -> StatChanges {
    StatChanges {
        morale: changes.morale.clamp(DELTA_MIN, DELTA_MAX),
        productivity: changes.productivity.clamp(DELTA_MIN, DELTA_MAX),
        cooperation: changes.cooperation.clamp(DELTA_MIN, DELTA_MAX),
    }
}

/// Deserialize the response through multiple recovery strategies:
/// 1. Direct `serde_json` deserialization
/// 2. Extract JSON from markdown code blocks
/// 3. Strip trailing commas and retry
/// 4. Extract from code block then strip commas
/// 5. Take the outermost `{ ... }` span of surrounding prose
fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, RunnerError> {
    let trimmed = raw.trim();

    // Strategy 1: direct parse
    let first_error = match serde_json::from_str::<T>(trimmed) {
        Ok(parsed) => return Ok(parsed),
        Err(e) => e,
    };

    // Strategy 2: extract from markdown code block
    let fenced = extract_json_from_codeblock(trimmed);
    if let Some(json_str) = fenced
        && let Ok(parsed) = serde_json::from_str::<T>(json_str)
    {
        return Ok(parsed);
    }

    // Strategy 3: strip trailing commas and retry
    if let Ok(parsed) = serde_json::from_str::<T>(&strip_trailing_commas(trimmed)) {
        return Ok(parsed);
    }

    // Strategy 4: extract from code block then strip commas
    if let Some(json_str) = fenced
        && let Ok(parsed) = serde_json::from_str::<T>(&strip_trailing_commas(json_str))
    {
        return Ok(parsed);
    }

    // Strategy 5: outermost object embedded in prose
    if let Some(json_str) = extract_outer_object(trimmed)
        && let Ok(parsed) = serde_json::from_str::<T>(&strip_trailing_commas(json_str))
    {
        return Ok(parsed);
    }

    Err(RunnerError::Parse(format!(
        "all parse strategies failed ({first_error}) for: {trimmed}"
    )))
}

/// Extract JSON from a markdown code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    // Look for ```json ... ``` or ``` ... ```
    let (open, tag_len) = text
        .find("```json")
        .map(|i| (i, 7))
        .or_else(|| text.find("```").map(|i| (i, 3)))?;
    let after_tag = open.checked_add(tag_len)?;
    let rest = text.get(after_tag..)?;
    // Content starts after the newline that ends the fence line, if any.
    let body = rest.find('\n').and_then(|nl| rest.get(nl..)).unwrap_or(rest);
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// The span from the first `{` to the last `}`.
fn extract_outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

/// Strip trailing commas before closing braces and brackets (common LLM error).
///
/// Commas inside string literals are left alone.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c == ',' {
            let rest = chars.clone().find(|n| !n.is_whitespace());
            if matches!(rest, Some('}' | ']')) {
                continue;
            }
        }
        if c == '"' {
            in_string = true;
        }
        result.push(c);
    }

    result
}

#[cfg(test)]
mod tests {
    use teamsim_core::roster::default_team;

    use super::*;

    const SCENARIO_JSON: &str = r#"{
        "title": "Budget Cut",
        "description": "Finance trimmed the budget by a fifth.",
        "agentInFocus": "Diana",
        "choices": [
            {"id": 1, "text": "Trim features"},
            {"id": 2, "text": "Negotiate with finance"},
            {"id": 3, "text": "Ask the team"}
        ]
    }"#;

    fn turn_json(morale: i32, focus: &str) -> String {
        format!(
            r#"{{
                "feedback": "The team appreciated the candor.",
                "agentResponse": "Diana: Thanks for asking us.",
                "statChanges": {{"morale": {morale}, "productivity": -2, "cooperation": 6}},
                "nextScenario": {{
                    "title": "Scope Debate",
                    "description": "Ben and Carla disagree on what to cut.",
                    "agentInFocus": "{focus}",
                    "choices": [{{"id": 1, "text": "Side with Ben"}}, {{"id": 2, "text": "Side with Carla"}}]
                }},
                "isFinalScenario": false
            }}"#
        )
    }

    #[test]
    fn parse_valid_scenario() {
        let team = default_team();
        let scenario = parse_scenario(SCENARIO_JSON, &team);
        assert!(scenario.is_ok());
        let Ok(scenario) = scenario else { return };
        assert_eq!(scenario.title, "Budget Cut");
        assert_eq!(scenario.agent_in_focus, "Diana");
        assert_eq!(scenario.choices.len(), 3);
    }

    #[test]
    fn parse_valid_turn_result() {
        let team = default_team();
        let result = parse_turn_result(&turn_json(8, "Ben"), &team);
        let Ok(result) = result else {
            panic!("turn result should parse");
        };
        assert_eq!(
            result.stat_changes,
            StatChanges {
                morale: 8,
                productivity: -2,
                cooperation: 6
            }
        );
        assert!(!result.is_final_scenario);
        assert_eq!(result.next_scenario.choices.len(), 2);
    }

    #[test]
    fn focus_agent_case_is_normalized() {
        let team = default_team();
        let result = parse_turn_result(&turn_json(0, "CARLA"), &team);
        let Ok(result) = result else {
            panic!("case-insensitive focus should be accepted");
        };
        assert_eq!(result.next_scenario.agent_in_focus, "Carla");
    }

    #[test]
    fn unknown_focus_agent_is_contract_error() {
        let team = default_team();
        let result = parse_turn_result(&turn_json(0, "Zed"), &team);
        assert!(matches!(
            result,
            Err(RunnerError::Contract(ContractViolation::UnknownFocusAgent { ref name })) if name == "Zed"
        ));
    }

    #[test]
    fn oversized_deltas_are_clamped() {
        let team = default_team();
        let result = parse_turn_result(&turn_json(45, "Ben"), &team);
        let Ok(result) = result else {
            panic!("oversized delta should be clamped, not rejected");
        };
        assert_eq!(result.stat_changes.morale, 20);

        let result = parse_turn_result(&turn_json(-99, "Ben"), &team);
        assert_eq!(result.map(|r| r.stat_changes.morale).ok(), Some(-20));
    }

    #[test]
    fn single_choice_is_contract_error() {
        let team = default_team();
        let raw = r#"{"title": "T", "description": "D", "agentInFocus": "Alex", "choices": [{"id": 1, "text": "Only"}]}"#;
        assert!(matches!(
            parse_scenario(raw, &team),
            Err(RunnerError::Contract(ContractViolation::ChoiceCount { count: 1 }))
        ));
    }

    #[test]
    fn parse_from_codeblock() {
        let team = default_team();
        let raw = format!("Here is the scenario:\n\n```json\n{SCENARIO_JSON}\n```\n\nEnjoy!");
        assert!(parse_scenario(&raw, &team).is_ok());
    }

    #[test]
    fn parse_trailing_comma() {
        let team = default_team();
        let raw = r#"{"title": "T", "description": "D", "agentInFocus": "Alex", "choices": [{"id": 1, "text": "A, B",}, {"id": 2, "text": "C"},],}"#;
        let scenario = parse_scenario(raw, &team);
        assert_eq!(
            scenario.ok().and_then(|s| s.choices.first().map(|c| c.text.clone())),
            Some("A, B".to_owned())
        );
    }

    #[test]
    fn parse_object_embedded_in_prose() {
        let team = default_team();
        let raw = format!("Sure! {SCENARIO_JSON} Let me know if you need more.");
        assert!(parse_scenario(&raw, &team).is_ok());
    }

    #[test]
    fn parse_garbage_is_parse_error() {
        let team = default_team();
        let result = parse_scenario("The team should probably take a break.", &team);
        assert!(matches!(result, Err(RunnerError::Parse(_))));
        assert!(matches!(parse_scenario("", &team), Err(RunnerError::Parse(_))));
    }

    #[test]
    fn extract_json_from_markdown() {
        let text = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_from_codeblock(text), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn extract_json_from_plain_codeblock() {
        let text = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_from_codeblock(text), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn strip_trailing_commas_basic() {
        assert_eq!(strip_trailing_commas(r#"{"a": 1, "b": 2,}"#), r#"{"a": 1, "b": 2}"#);
        assert_eq!(strip_trailing_commas("[1, 2, 3,\n]"), "[1, 2, 3\n]");
    }

    #[test]
    fn strip_trailing_commas_leaves_strings_alone() {
        let input = r#"{"text": "wait,}"}"#;
        assert_eq!(strip_trailing_commas(input), input);
    }
}
