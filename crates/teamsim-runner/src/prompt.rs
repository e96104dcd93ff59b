//! Prompt template loading and rendering via `minijinja`.
//!
//! Four templates make up every prompt: `system.j2` (the game-master role),
//! `team.j2` (roster and current stats), and one of `opening.j2` or
//! `turn.j2`. The templates ship inside the binary; a directory can
//! override any subset of them so operators can tune the narrative without
//! recompiling.

use std::path::Path;

use minijinja::Environment;
use serde_json::json;
use teamsim_core::TurnRequest;
use teamsim_types::{Agent, Language, TeamStats};
use tracing::debug;

use crate::error::RunnerError;

/// Template name, file name, and built-in source.
const TEMPLATES: [(&str, &str, &str); 4] = [
    ("system", "system.j2", include_str!("../templates/system.j2")),
    ("team", "team.j2", include_str!("../templates/team.j2")),
    ("opening", "opening.j2", include_str!("../templates/opening.j2")),
    ("turn", "turn.j2", include_str!("../templates/turn.j2")),
];

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message establishing the game-master role.
    pub system: String,
    /// User message with the team, the situation, and the response shape.
    pub user: String,
}

impl PromptEngine {
    /// Create a prompt engine with the built-in templates.
    pub fn builtin() -> Result<Self, RunnerError> {
        let mut env = Environment::new();
        for (name, _, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|e| RunnerError::Template(format!("failed to add {name} template: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Create a prompt engine, letting files in `dir` replace built-ins.
    ///
    /// Templates missing from the directory keep their built-in source.
    pub fn from_dir(dir: &Path) -> Result<Self, RunnerError> {
        if !dir.is_dir() {
            return Err(RunnerError::Template(format!(
                "templates directory {} does not exist",
                dir.display()
            )));
        }

        let mut env = Environment::new();
        for (name, file, builtin) in TEMPLATES {
            let path = dir.join(file);
            if path.is_file() {
                let source = std::fs::read_to_string(&path).map_err(|e| {
                    RunnerError::Template(format!("failed to read {}: {e}", path.display()))
                })?;
                debug!(template = name, path = %path.display(), "using template override");
                env.add_template_owned(name, source).map_err(|e| {
                    RunnerError::Template(format!("failed to add {name} template: {e}"))
                })?;
            } else {
                env.add_template(name, builtin).map_err(|e| {
                    RunnerError::Template(format!("failed to add {name} template: {e}"))
                })?;
            }
        }
        Ok(Self { env })
    }

    /// Built-in templates, or `dir` overrides when a directory is given.
    pub fn load(dir: Option<&Path>) -> Result<Self, RunnerError> {
        dir.map_or_else(Self::builtin, Self::from_dir)
    }

    /// Render the prompt asking for a game's opening scenario.
    pub fn render_opening(
        &self,
        team: &[Agent],
        stats: TeamStats,
        language: Language,
    ) -> Result<RenderedPrompt, RunnerError> {
        let ctx = json!({
            "language": language.display_name(),
            "team": team_context(team),
            "names": roster_names(team),
            "stats": stats,
        });
        self.compose("opening", &ctx)
    }

    /// Render the prompt asking for the outcome of a choice.
    pub fn render_turn(&self, request: &TurnRequest<'_>) -> Result<RenderedPrompt, RunnerError> {
        let ctx = json!({
            "language": request.language.display_name(),
            "team": team_context(request.team),
            "names": roster_names(request.team),
            "stats": request.stats,
            "scenario": request.scenario,
            "choice": request.choice,
            "next_turn": request.turn.saturating_add(1),
            "max_turns": request.max_turns,
            "is_final": request.is_final_turn(),
        });
        self.compose("turn", &ctx)
    }

    fn compose(&self, task: &str, ctx: &serde_json::Value) -> Result<RenderedPrompt, RunnerError> {
        let system = self.render("system", ctx)?;
        let team = self.render("team", ctx)?;
        let task_text = self.render(task, ctx)?;
        Ok(RenderedPrompt {
            system,
            user: format!("{team}\n\n{task_text}"),
        })
    }

    fn render(&self, name: &str, ctx: &serde_json::Value) -> Result<String, RunnerError> {
        self.env
            .get_template(name)
            .map_err(|e| RunnerError::Template(format!("missing {name} template: {e}")))?
            .render(ctx)
            .map_err(|e| RunnerError::Template(format!("{name} render failed: {e}")))
    }
}

fn team_context(team: &[Agent]) -> Vec<serde_json::Value> {
    team.iter()
        .map(|a| {
            json!({
                "name": a.name,
                "personality": a.personality.as_str(),
                "description": a.personality.description(),
            })
        })
        .collect()
}

fn roster_names(team: &[Agent]) -> String {
    team.iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use teamsim_core::roster::default_team;
    use teamsim_core::stats::initial_stats;
    use teamsim_types::{Choice, Difficulty, Scenario};

    use super::*;

    fn unique_dir(label: &str) -> std::path::PathBuf {
        let unique = format!(
            "teamsim_{label}_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        std::env::temp_dir().join(unique)
    }

    fn scenario() -> Scenario {
        Scenario {
            title: "Missed Deadline".to_owned(),
            description: "The beta slipped a week.".to_owned(),
            agent_in_focus: "Carla".to_owned(),
            choices: vec![
                Choice {
                    id: 1,
                    text: "Cut scope".to_owned(),
                },
                Choice {
                    id: 2,
                    text: "Ask for more time".to_owned(),
                },
            ],
        }
    }

    #[test]
    fn opening_prompt_lists_team_and_stats() {
        let Ok(engine) = PromptEngine::builtin() else {
            panic!("built-in templates must load");
        };
        let team = default_team();
        let prompt = engine.render_opening(&team, initial_stats(Difficulty::Hard), Language::Ko);
        let Ok(prompt) = prompt else {
            panic!("opening prompt should render");
        };

        assert!(prompt.system.contains("game master"));
        assert!(prompt.system.contains("Korean"));
        assert!(prompt.user.contains("- Alex (Leader): Decisive and action-oriented"));
        assert!(prompt.user.contains("Cooperation: 55/100"));
        assert!(prompt.user.contains("Alex, Ben, Carla, Diana"));
        assert!(prompt.user.contains("opening scenario"));
    }

    #[test]
    fn turn_prompt_carries_choice_and_final_hint() {
        let Ok(engine) = PromptEngine::builtin() else {
            panic!("built-in templates must load");
        };
        let team = default_team();
        let scenario = scenario();
        let choice = Choice {
            id: 2,
            text: "Ask for more time".to_owned(),
        };
        let request = TurnRequest {
            team: &team,
            stats: initial_stats(Difficulty::Normal),
            scenario: &scenario,
            choice: &choice,
            turn: 4,
            max_turns: 5,
            language: Language::En,
        };
        let Ok(prompt) = engine.render_turn(&request) else {
            panic!("turn prompt should render");
        };

        assert!(prompt.user.contains("- Title: Missed Deadline"));
        assert!(prompt.user.contains("Player's Choice: \"Ask for more time\""));
        assert!(prompt.user.contains("turn 5 of 5"));
        assert!(prompt.user.contains("set 'isFinalScenario' to true"));
        assert!(prompt.system.contains("English"));
    }

    #[test]
    fn directory_overrides_only_present_templates() {
        let dir = unique_dir("prompt_override");
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join("system.j2"), "Narrate in {{ language }} like a pirate.").ok();

        let engine = PromptEngine::from_dir(&dir);
        assert!(engine.is_ok(), "partial override should load");
        let Ok(engine) = engine else { return };

        let team = default_team();
        let prompt = engine.render_opening(&team, initial_stats(Difficulty::Easy), Language::En);
        let Ok(prompt) = prompt else {
            panic!("opening prompt should render");
        };
        assert_eq!(prompt.system, "Narrate in English like a pirate.");
        assert!(prompt.user.contains("THE TEAM:"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_directory_is_template_error() {
        let dir = unique_dir("prompt_missing");
        let result = PromptEngine::load(Some(&dir));
        assert!(matches!(result, Err(RunnerError::Template(_))));
    }

    #[test]
    fn broken_override_is_template_error() {
        let dir = unique_dir("prompt_broken");
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join("turn.j2"), "{% for x in %}").ok();

        let result = PromptEngine::from_dir(&dir);
        assert!(matches!(result, Err(RunnerError::Template(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
