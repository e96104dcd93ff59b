//! Narrative provider trait and stub implementation.
//!
//! The engine asks a [`NarrativeProvider`] for the opening scenario and for
//! the outcome of every choice. The trait abstracts the mechanism: an LLM
//! backend, a scripted story, or a test double. Failures are expected; the
//! engine recovers from every [`ProviderError`] with a fallback payload.

use std::future::Future;

use teamsim_types::{Agent, Choice, ContractViolation, Language, Scenario, TeamStats, TurnResult};

/// Errors a narrative provider can report.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// A call was made before the provider received a credential.
    #[error("narrative provider is not initialized")]
    Uninitialized,

    /// The credential was rejected locally or by the backing service.
    #[error("invalid credential: {reason}")]
    InvalidCredential {
        /// Why the credential was rejected.
        reason: String,
    },

    /// The backing service failed or was unreachable.
    #[error("backend error: {0}")]
    Backend(String),

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Parse(String),

    /// The response decoded but breaks the contract.
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),

    /// The call did not finish within the deadline.
    #[error("provider call exceeded {timeout_ms}ms")]
    Timeout {
        /// The deadline that was exceeded.
        timeout_ms: u64,
    },
}

impl ProviderError {
    /// Whether trying the same call again could succeed.
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Uninitialized | Self::InvalidCredential { .. })
    }
}

/// Everything a provider needs to resolve one player choice.
#[derive(Debug, Clone, Copy)]
pub struct TurnRequest<'a> {
    /// The roster.
    pub team: &'a [Agent],
    /// Stats before this choice is applied.
    pub stats: TeamStats,
    /// The scenario being answered.
    pub scenario: &'a Scenario,
    /// The choice the player made.
    pub choice: &'a Choice,
    /// 1-based number of the turn being played.
    pub turn: u32,
    /// Total playable turns.
    pub max_turns: u32,
    /// Language for all returned text.
    pub language: Language,
}

impl TurnRequest<'_> {
    /// Hint for the provider: the scenario it returns should close the game.
    pub const fn is_final_turn(&self) -> bool {
        self.turn >= self.max_turns.saturating_sub(1)
    }
}

/// A source of narrative content for the turn engine.
///
/// Implementations may fail or take arbitrarily long; the engine applies a
/// deadline and substitutes fallbacks. Returned scenarios should name a
/// roster agent in focus and offer two or three choices with unique ids.
/// Returned stat deltas should lie in `[-20, 20]`.
pub trait NarrativeProvider: Send + Sync {
    /// Produce the scenario that opens a new game.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if no usable scenario could be produced.
    fn fetch_opening_scenario(
        &self,
        team: &[Agent],
        stats: TeamStats,
        language: Language,
    ) -> impl Future<Output = Result<Scenario, ProviderError>> + Send;

    /// Resolve a player's choice into feedback, deltas, and the next scenario.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if no usable result could be produced.
    fn fetch_turn_result(
        &self,
        request: &TurnRequest<'_>,
    ) -> impl Future<Output = Result<TurnResult, ProviderError>> + Send;
}

/// A provider that never has a credential.
///
/// Every call fails with [`ProviderError::Uninitialized`], so a game driven
/// by it runs entirely on fallbacks. Useful offline and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubProvider;

impl StubProvider {
    /// Create a new stub provider.
    pub const fn new() -> Self {
        Self
    }
}

impl NarrativeProvider for StubProvider {
    async fn fetch_opening_scenario(
        &self,
        _team: &[Agent],
        _stats: TeamStats,
        _language: Language,
    ) -> Result<Scenario, ProviderError> {
        Err(ProviderError::Uninitialized)
    }

    async fn fetch_turn_result(
        &self,
        _request: &TurnRequest<'_>,
    ) -> Result<TurnResult, ProviderError> {
        Err(ProviderError::Uninitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;
    use crate::roster::default_team;
    use crate::stats::DEFAULT_STATS;

    #[test]
    fn final_turn_hint_is_one_before_limit() {
        let team = default_team();
        let scenario = fallback::opening_scenario(&team, Language::En);
        let choice = Choice {
            id: 1,
            text: "go".to_owned(),
        };
        let mut request = TurnRequest {
            team: &team,
            stats: DEFAULT_STATS,
            scenario: &scenario,
            choice: &choice,
            turn: 3,
            max_turns: 5,
            language: Language::En,
        };
        assert!(!request.is_final_turn());
        request.turn = 4;
        assert!(request.is_final_turn());
        request.turn = 5;
        assert!(request.is_final_turn());
    }

    #[test]
    fn credential_errors_are_not_retryable() {
        assert!(!ProviderError::Uninitialized.is_retryable());
        assert!(
            !ProviderError::InvalidCredential {
                reason: "short".to_owned()
            }
            .is_retryable()
        );
        assert!(ProviderError::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(ProviderError::Backend("503".to_owned()).is_retryable());
    }

    #[tokio::test]
    async fn stub_always_uninitialized() {
        let stub = StubProvider::new();
        let team = default_team();
        let result = stub
            .fetch_opening_scenario(&team, DEFAULT_STATS, Language::En)
            .await;
        assert!(matches!(result, Err(ProviderError::Uninitialized)));
    }
}
