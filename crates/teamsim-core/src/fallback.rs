//! Deterministic stand-ins used when the narrative provider fails.
//!
//! The opening fallback lets a game start without the provider. The turn
//! fallback applies a flat penalty and steers into a closing debrief marked
//! final, so a broken provider ends the game instead of stalling it.

use teamsim_types::{Agent, Choice, Language, Scenario, StatChanges, TurnResult};

/// Delta applied to every stat when a turn falls back.
pub const FALLBACK_PENALTY: i32 = -5;

/// Name used for the focus agent if the roster is somehow empty.
const FALLBACK_FOCUS: &str = "Alex";

/// Localized strings for both fallbacks.
struct FallbackText {
    opening_title: &'static str,
    opening_description: &'static str,
    opening_choice_fix: &'static str,
    opening_choice_brainstorm: &'static str,
    turn_feedback: &'static str,
    turn_agent_line: &'static str,
    debrief_title: &'static str,
    debrief_description: &'static str,
    debrief_choice_good: &'static str,
    debrief_choice_bad: &'static str,
}

const EN: FallbackText = FallbackText {
    opening_title: "Unexpected Downtime",
    opening_description: "The main server has crashed, and the team is blocked. What is the first priority?",
    opening_choice_fix: "Focus on getting a temporary fix, no matter how scrappy.",
    opening_choice_brainstorm: "Let's use this time to brainstorm other project ideas.",
    turn_feedback: "An unexpected error occurred. The simulation will proceed with a default path.",
    turn_agent_line: "Well, that was unexpected. Let's just move on to the next task.",
    debrief_title: "Project Debrief",
    debrief_description: "The project has reached its conclusion. It's time to hold a debrief meeting.",
    debrief_choice_good: "Focus on what went well.",
    debrief_choice_bad: "Focus on what went wrong.",
};

const KO: FallbackText = FallbackText {
    opening_title: "예상치 못한 다운타임",
    opening_description: "메인 서버가 다운되어 팀의 작업이 중단되었습니다. 최우선 과제는 무엇입니까?",
    opening_choice_fix: "임시방편이라도 좋으니 빠른 해결책에 집중한다.",
    opening_choice_brainstorm: "이 시간을 다른 프로젝트 아이디어를 브레인스토밍하는 데 사용한다.",
    turn_feedback: "예기치 않은 오류가 발생했습니다. 시뮬레이션은 기본 경로로 진행됩니다.",
    turn_agent_line: "음, 예상치 못했네요. 다음 작업으로 넘어가죠.",
    debrief_title: "프로젝트 보고",
    debrief_description: "프로젝트가 결론에 도달했습니다. 보고 회의를 열 시간입니다.",
    debrief_choice_good: "잘된 점에 집중하기",
    debrief_choice_bad: "잘못된 점에 집중하기",
};

const fn text_for(language: Language) -> &'static FallbackText {
    match language {
        Language::En => &EN,
        Language::Ko => &KO,
    }
}

fn focus_name(team: &[Agent]) -> String {
    team.first()
        .map_or_else(|| FALLBACK_FOCUS.to_owned(), |a| a.name.clone())
}

fn two_choices(first: &str, second: &str) -> Vec<Choice> {
    vec![
        Choice {
            id: 1,
            text: first.to_owned(),
        },
        Choice {
            id: 2,
            text: second.to_owned(),
        },
    ]
}

/// Opening scenario used when the provider cannot supply one.
pub fn opening_scenario(team: &[Agent], language: Language) -> Scenario {
    let t = text_for(language);
    Scenario {
        title: t.opening_title.to_owned(),
        description: t.opening_description.to_owned(),
        agent_in_focus: focus_name(team),
        choices: two_choices(t.opening_choice_fix, t.opening_choice_brainstorm),
    }
}

/// Turn result used when the provider cannot resolve a choice.
///
/// The apology is voiced by the agent in focus of the scenario that was
/// being played, and the follow-up debrief is always final.
pub fn turn_result(team: &[Agent], scenario: &Scenario, language: Language) -> TurnResult {
    let t = text_for(language);
    TurnResult {
        feedback: t.turn_feedback.to_owned(),
        agent_response: format!("{}: {}", scenario.agent_in_focus, t.turn_agent_line),
        stat_changes: StatChanges::uniform(FALLBACK_PENALTY),
        next_scenario: Scenario {
            title: t.debrief_title.to_owned(),
            description: t.debrief_description.to_owned(),
            agent_in_focus: focus_name(team),
            choices: two_choices(t.debrief_choice_good, t.debrief_choice_bad),
        },
        is_final_scenario: true,
    }
}

#[cfg(test)]
mod tests {
    use teamsim_types::{check_scenario, check_turn_result};

    use super::*;
    use crate::roster::default_team;

    #[test]
    fn opening_fallback_is_valid_in_both_languages() {
        let team = default_team();
        for language in [Language::En, Language::Ko] {
            let scenario = opening_scenario(&team, language);
            assert_eq!(check_scenario(&scenario, &team), Ok(()));
            assert_eq!(scenario.choices.len(), 2);
        }
        assert_eq!(opening_scenario(&team, Language::En).title, "Unexpected Downtime");
        assert_eq!(opening_scenario(&team, Language::Ko).title, "예상치 못한 다운타임");
    }

    #[test]
    fn turn_fallback_penalizes_and_ends() {
        let team = default_team();
        let current = opening_scenario(&team, Language::En);
        let result = turn_result(&team, &current, Language::En);
        assert_eq!(result.stat_changes, StatChanges::uniform(-5));
        assert!(result.is_final_scenario);
        assert_eq!(result.next_scenario.title, "Project Debrief");
        assert!(result.agent_response.starts_with("Alex: "));
        assert_eq!(check_turn_result(&result, &team), Ok(()));
    }

    #[test]
    fn turn_fallback_respects_language() {
        let team = default_team();
        let current = opening_scenario(&team, Language::Ko);
        let result = turn_result(&team, &current, Language::Ko);
        assert_eq!(result.next_scenario.title, "프로젝트 보고");
        assert!(result.feedback.contains("오류"));
    }

    #[test]
    fn deterministic() {
        let team = default_team();
        let current = opening_scenario(&team, Language::En);
        assert_eq!(
            turn_result(&team, &current, Language::En),
            turn_result(&team, &current, Language::En)
        );
    }
}
