//! The default team roster.

use teamsim_types::{Agent, Personality};

/// Names of the default team, one per personality in [`Personality::ALL`] order.
const DEFAULT_NAMES: [&str; 4] = ["Alex", "Ben", "Carla", "Diana"];

/// Avatar service the default roster points at.
const AVATAR_BASE_URL: &str = "https://i.pravatar.cc/150?u=";

/// Build the four-member roster every game starts with.
pub fn default_team() -> Vec<Agent> {
    DEFAULT_NAMES
        .iter()
        .zip(Personality::ALL)
        .map(|(name, personality)| Agent {
            name: (*name).to_owned(),
            personality,
            avatar_url: format!("{AVATAR_BASE_URL}{}", name.to_lowercase()),
        })
        .collect()
}

/// Find a roster member by name, ignoring ASCII case.
pub fn find_agent<'a>(team: &'a [Agent], name: &str) -> Option<&'a Agent> {
    team.iter()
        .find(|a| a.name == name)
        .or_else(|| team.iter().find(|a| a.name.eq_ignore_ascii_case(name.trim())))
}
