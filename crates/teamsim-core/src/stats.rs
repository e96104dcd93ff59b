//! Stat arithmetic: seeding from difficulty and clamped delta application.
//!
//! Every stat mutation in the engine goes through [`apply_changes`], so the
//! `[STAT_MIN, STAT_MAX]` invariant holds no matter what a provider reports.

use teamsim_types::{Difficulty, STAT_MAX, STAT_MIN, StatChanges, TeamStats};

/// Base value for every stat before difficulty is applied.
pub const BASE_STAT: u8 = 70;

/// Stats shown before any game has started.
pub const DEFAULT_STATS: TeamStats = TeamStats {
    morale: BASE_STAT,
    productivity: BASE_STAT,
    cooperation: BASE_STAT,
};

/// Starting cooperation for a difficulty.
pub const fn initial_cooperation(difficulty: Difficulty) -> u8 {
    match difficulty {
        Difficulty::Easy => 85,
        Difficulty::Normal => BASE_STAT,
        Difficulty::Hard => 55,
    }
}

/// Starting stats for a new game.
pub const fn initial_stats(difficulty: Difficulty) -> TeamStats {
    TeamStats {
        morale: BASE_STAT,
        productivity: BASE_STAT,
        cooperation: initial_cooperation(difficulty),
    }
}

/// Add a signed delta to a stat and clamp into `[STAT_MIN, STAT_MAX]`.
pub fn clamp_stat(value: u8, delta: i32) -> u8 {
    let sum = i32::from(value)
        .saturating_add(delta)
        .clamp(i32::from(STAT_MIN), i32::from(STAT_MAX));
    u8::try_from(sum).unwrap_or(STAT_MAX)
}

/// Apply deltas to each stat independently.
pub fn apply_changes(stats: TeamStats, changes: StatChanges) -> TeamStats {
    TeamStats {
        morale: clamp_stat(stats.morale, changes.morale),
        productivity: clamp_stat(stats.productivity, changes.productivity),
        cooperation: clamp_stat(stats.cooperation, changes.cooperation),
    }
}
