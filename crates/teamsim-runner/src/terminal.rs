//! Plain-text rendering for the terminal driver.
//!
//! Everything here is a pure function from engine state to a string so the
//! binary only has to print and read lines.

use std::fmt::Write as _;

use teamsim_core::Outcome;
use teamsim_types::{Choice, Feedback, GameState, Language, Scenario, StatChanges, TeamStats};

/// Localized labels used across screens.
struct Labels {
    morale: &'static str,
    productivity: &'static str,
    cooperation: &'static str,
    turn: &'static str,
    of: &'static str,
    prompt: &'static str,
    thinking: &'static str,
    final_stats: &'static str,
}

const EN: Labels = Labels {
    morale: "Morale",
    productivity: "Productivity",
    cooperation: "Cooperation",
    turn: "Turn",
    of: "of",
    prompt: "What do you do?",
    thinking: "AI is thinking...",
    final_stats: "Final Stats:",
};

const KO: Labels = Labels {
    morale: "사기",
    productivity: "생산성",
    cooperation: "협조성",
    turn: "턴",
    of: "/",
    prompt: "어떻게 하시겠습니까?",
    thinking: "AI가 생각 중입니다...",
    final_stats: "최종 통계:",
};

const fn labels(language: Language) -> &'static Labels {
    match language {
        Language::En => &EN,
        Language::Ko => &KO,
    }
}

/// The loading notice shown while the provider is working.
pub const fn thinking(language: Language) -> &'static str {
    labels(language).thinking
}

/// Stats as `Morale: 70/100 | ...`.
pub fn render_stats(stats: TeamStats, language: Language) -> String {
    let l = labels(language);
    format!(
        "{}: {}/100 | {}: {}/100 | {}: {}/100",
        l.morale, stats.morale, l.productivity, stats.productivity, l.cooperation, stats.cooperation
    )
}

/// The turn header, stats, scenario, and numbered choices.
pub fn render_scenario(state: &GameState, scenario: &Scenario, max_turns: u32) -> String {
    let l = labels(state.language);
    let mut out = String::new();
    let _ = writeln!(out, "== {} {} {} {} ==", l.turn, state.turn, l.of, max_turns);
    let _ = writeln!(out, "{}", render_stats(state.stats, state.language));
    let _ = writeln!(out);
    let _ = writeln!(out, "{} [{}]", scenario.title, scenario.agent_in_focus);
    let _ = writeln!(out, "{}", scenario.description);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", l.prompt);
    for choice in &scenario.choices {
        let _ = writeln!(out, "  {}) {}", choice.id, choice.text);
    }
    out
}

/// The feedback message followed by every non-zero stat change.
pub fn render_feedback(feedback: &Feedback, language: Language) -> String {
    let mut out = feedback.message.clone();
    let changes = render_changes(feedback.stat_changes, language);
    if !changes.is_empty() {
        out.push_str("\n\n");
        out.push_str(&changes.join("\n"));
    }
    out
}

fn render_changes(changes: StatChanges, language: Language) -> Vec<String> {
    let l = labels(language);
    [
        (l.morale, changes.morale),
        (l.productivity, changes.productivity),
        (l.cooperation, changes.cooperation),
    ]
    .into_iter()
    .filter(|(_, delta)| *delta != 0)
    .map(|(label, delta)| format!("{label}: {delta:+}%"))
    .collect()
}

/// The verdict and final stats.
pub fn render_end(state: &GameState) -> String {
    let outcome = Outcome::evaluate(&state.stats);
    let l = labels(state.language);
    format!(
        "{}\n{}\n\n{}\n{}",
        outcome.title(state.language),
        outcome.message(state.language),
        l.final_stats,
        render_stats(state.stats, state.language)
    )
}

/// Resolve a typed choice number against the scenario.
pub fn parse_choice(input: &str, scenario: &Scenario) -> Option<Choice> {
    let id: u32 = input.trim().parse().ok()?;
    scenario.choice(id).cloned()
}
