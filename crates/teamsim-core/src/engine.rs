//! The turn engine: sole owner of [`GameState`] and its transitions.
//!
//! ```text
//! start()        StartScreen/any -> InProgress        (opening scenario fetched)
//! submit_choice  InProgress      -> ShowFeedback      (stats applied at once)
//! dwell expires  ShowFeedback    -> InProgress | EndScreen
//! restart()      any             -> StartScreen
//! ```
//!
//! # Concurrency
//!
//! At most one provider request is in flight per engine. The `loading` flag
//! is raised before the request and lowered only once the turn has fully
//! resolved, so a second `submit_choice` during that window is ignored.
//!
//! Each `start` and `restart` bumps a monotonic session counter. Provider
//! responses and dwell timers remember the session they were issued for and
//! are dropped if it has changed by the time they land. The state lock is
//! never held across a provider call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use teamsim_types::{
    Choice, Difficulty, Feedback, GameState, GameStatus, Language, Scenario, check_scenario,
    out_of_range_deltas,
};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::fallback;
use crate::provider::{NarrativeProvider, ProviderError, TurnRequest};
use crate::roster::default_team;
use crate::stats::{DEFAULT_STATS, apply_changes, initial_stats};

/// Everything an observer needs to render the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineView {
    /// The game state.
    pub state: GameState,
    /// True while a provider request or feedback dwell is outstanding.
    pub loading: bool,
    /// Identifier of the current session.
    pub session: u64,
}

/// Result of [`TurnEngine::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The opening scenario is in place.
    Ready {
        /// Whether the canned opening had to be used.
        fallback: bool,
    },
    /// A restart or newer start superseded this one; its scenario was dropped.
    Superseded,
}

/// Why a choice was not acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The game is not waiting for a decision.
    NotInProgress,
    /// An earlier request is still outstanding.
    RequestPending,
    /// No scenario has been fetched yet.
    NoScenario,
    /// The choice id is not offered by the current scenario.
    UnknownChoice,
}

/// Result of [`TurnEngine::submit_choice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Feedback is showing and the dwell timer is running.
    Resolved {
        /// Whether the canned turn result had to be used.
        fallback: bool,
        /// Whether the game ends when the dwell expires.
        ends_game: bool,
    },
    /// The choice was a no-op.
    Ignored(IgnoreReason),
    /// A restart or new game superseded this choice; its result was dropped.
    Superseded,
}

/// The transition waiting for the feedback dwell to expire.
#[derive(Debug)]
struct PendingAdvance {
    session: u64,
    ends_game: bool,
    next_scenario: Scenario,
}

#[derive(Debug)]
struct Inner {
    state: GameState,
    loading: bool,
    session: u64,
    dwell: Option<JoinHandle<()>>,
}

impl Inner {
    fn cancel_dwell(&mut self) {
        if let Some(handle) = self.dwell.take() {
            handle.abort();
        }
    }

    fn begin_session(&mut self) -> u64 {
        self.cancel_dwell();
        self.session = self.session.wrapping_add(1);
        self.session
    }
}

#[derive(Debug)]
struct Shared {
    inner: Mutex<Inner>,
    views: watch::Sender<EngineView>,
}

impl Shared {
    fn publish(&self, inner: &Inner) {
        self.views.send_replace(EngineView {
            state: inner.state.clone(),
            loading: inner.loading,
            session: inner.session,
        });
    }
}

/// The state of a session that has not started.
pub fn start_screen_state() -> GameState {
    GameState {
        status: GameStatus::StartScreen,
        team: default_team(),
        stats: DEFAULT_STATS,
        current_scenario: None,
        turn: 0,
        feedback: None,
        language: Language::default(),
        difficulty: Difficulty::default(),
    }
}

/// The turn engine.
///
/// Cheap to share by reference: all methods take `&self`. Must be used
/// from within a Tokio runtime because the feedback dwell is a spawned task.
pub struct TurnEngine<P> {
    provider: Arc<P>,
    config: EngineConfig,
    shared: Arc<Shared>,
}

impl<P: NarrativeProvider> TurnEngine<P> {
    /// Create an engine on the start screen.
    pub fn new(provider: Arc<P>, config: EngineConfig) -> Self {
        let inner = Inner {
            state: start_screen_state(),
            loading: false,
            session: 0,
            dwell: None,
        };
        let (views, _) = watch::channel(EngineView {
            state: inner.state.clone(),
            loading: false,
            session: 0,
        });
        Self {
            provider,
            config,
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                views,
            }),
        }
    }

    /// The engine configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The narrative provider.
    pub const fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Latest published view.
    pub fn view(&self) -> EngineView {
        self.shared.views.borrow().clone()
    }

    /// Latest published game state.
    pub fn state(&self) -> GameState {
        self.shared.views.borrow().state.clone()
    }

    /// Whether a provider request or dwell is outstanding.
    pub fn is_loading(&self) -> bool {
        self.shared.views.borrow().loading
    }

    /// Receive every view the engine publishes from now on.
    pub fn subscribe(&self) -> watch::Receiver<EngineView> {
        self.shared.views.subscribe()
    }

    /// Begin a new game and fetch its opening scenario.
    ///
    /// Legal from any state. Anything still pending from a previous session
    /// is discarded. Stats are seeded from `difficulty`; the game is
    /// `InProgress` with no scenario and `loading` raised until the opening
    /// scenario arrives.
    pub async fn start(&self, language: Language, difficulty: Difficulty) -> StartOutcome {
        let (session, state) = {
            let mut inner = self.shared.inner.lock().await;
            let session = inner.begin_session();
            inner.state = GameState {
                status: GameStatus::InProgress,
                team: default_team(),
                stats: initial_stats(difficulty),
                current_scenario: None,
                turn: 1,
                feedback: None,
                language,
                difficulty,
            };
            inner.loading = true;
            self.shared.publish(&inner);
            (session, inner.state.clone())
        };

        info!(
            session,
            language = language.code(),
            difficulty = ?difficulty,
            "game started"
        );

        let provider = &*self.provider;
        let team = state.team.as_slice();
        let stats = state.stats;
        let fetched = self
            .call_provider("opening_scenario", move || async move {
                let scenario = provider
                    .fetch_opening_scenario(team, stats, language)
                    .await?;
                check_scenario(&scenario, team)?;
                Ok::<_, ProviderError>(scenario)
            })
            .await;

        let (scenario, used_fallback) = match fetched {
            Ok(scenario) => (scenario, false),
            Err(e) => {
                warn!(session, error = %e, "opening scenario unavailable, using fallback");
                (fallback::opening_scenario(team, language), true)
            }
        };

        let mut inner = self.shared.inner.lock().await;
        if inner.session != session {
            debug!(session, current = inner.session, "discarding stale opening scenario");
            return StartOutcome::Superseded;
        }
        debug!(session, title = scenario.title, "opening scenario ready");
        inner.state.current_scenario = Some(scenario);
        inner.loading = false;
        self.shared.publish(&inner);
        StartOutcome::Ready {
            fallback: used_fallback,
        }
    }

    /// Resolve the player's choice for the current scenario.
    ///
    /// Only the choice's `id` is consulted; the scenario's own copy of the
    /// choice is what the provider sees. On resolution the clamped stats and
    /// the feedback payload are applied together, the status becomes
    /// `ShowFeedback`, and a dwell timer is scheduled to advance the game.
    pub async fn submit_choice(&self, choice: &Choice) -> SubmitOutcome {
        let (session, state, scenario, chosen) = {
            let mut inner = self.shared.inner.lock().await;
            if inner.state.status != GameStatus::InProgress {
                return SubmitOutcome::Ignored(IgnoreReason::NotInProgress);
            }
            if inner.loading {
                return SubmitOutcome::Ignored(IgnoreReason::RequestPending);
            }
            let Some(scenario) = inner.state.current_scenario.clone() else {
                return SubmitOutcome::Ignored(IgnoreReason::NoScenario);
            };
            let Some(chosen) = scenario.choice(choice.id).cloned() else {
                return SubmitOutcome::Ignored(IgnoreReason::UnknownChoice);
            };
            inner.loading = true;
            self.shared.publish(&inner);
            (inner.session, inner.state.clone(), scenario, chosen)
        };

        let turn = state.turn;
        let language = state.language;
        let team = state.team.as_slice();
        let request = TurnRequest {
            team,
            stats: state.stats,
            scenario: &scenario,
            choice: &chosen,
            turn,
            max_turns: self.config.max_turns,
            language,
        };
        debug!(
            session,
            turn,
            choice_id = chosen.id,
            final_turn_hint = request.is_final_turn(),
            "requesting turn result"
        );

        let provider = &*self.provider;
        let request_ref = &request;
        let fetched = self
            .call_provider("turn_result", move || async move {
                let result = provider.fetch_turn_result(request_ref).await?;
                check_scenario(&result.next_scenario, request_ref.team)?;
                Ok::<_, ProviderError>(result)
            })
            .await;

        let (result, used_fallback) = match fetched {
            Ok(result) => (result, false),
            Err(e) => {
                warn!(session, turn, error = %e, "turn result unavailable, using fallback");
                (fallback::turn_result(team, &scenario, language), true)
            }
        };
        for violation in out_of_range_deltas(&result.stat_changes) {
            warn!(session, turn, %violation, "stat delta outside contract, clamping stats");
        }

        let ends_game = result.is_final_scenario || turn >= self.config.max_turns;

        let mut inner = self.shared.inner.lock().await;
        if inner.session != session {
            debug!(session, current = inner.session, "discarding stale turn result");
            return SubmitOutcome::Superseded;
        }

        let stats = apply_changes(inner.state.stats, result.stat_changes);
        inner.state.stats = stats;
        inner.state.status = GameStatus::ShowFeedback;
        inner.state.feedback = Some(Feedback {
            message: format!("{}\n\n{}", result.agent_response, result.feedback),
            stat_changes: result.stat_changes,
        });
        info!(
            session,
            turn,
            morale = stats.morale,
            productivity = stats.productivity,
            cooperation = stats.cooperation,
            fallback = used_fallback,
            ends_game,
            "turn resolved"
        );

        let pending = PendingAdvance {
            session,
            ends_game,
            next_scenario: result.next_scenario,
        };
        inner.dwell = Some(tokio::spawn(finish_turn(
            Arc::clone(&self.shared),
            pending,
            self.config.feedback_dwell(),
        )));
        self.shared.publish(&inner);

        SubmitOutcome::Resolved {
            fallback: used_fallback,
            ends_game,
        }
    }

    /// Return to the start screen with default settings.
    ///
    /// Always legal and idempotent. Any in-flight provider response or
    /// pending dwell from the previous session is discarded.
    pub async fn restart(&self) {
        let mut inner = self.shared.inner.lock().await;
        let session = inner.begin_session();
        inner.state = start_screen_state();
        inner.loading = false;
        self.shared.publish(&inner);
        info!(session, "game reset to start screen");
    }

    /// Run a provider call under the deadline, retrying retryable failures.
    async fn call_provider<T, F, Fut>(
        &self,
        operation: &'static str,
        mut call: F,
    ) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let deadline = self.config.provider_timeout();
        let mut attempt: u32 = 0;
        loop {
            let error = match timeout(deadline, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => e,
                Err(_elapsed) => ProviderError::Timeout {
                    timeout_ms: self.config.provider_timeout_ms,
                },
            };
            if attempt >= self.config.provider_retries || !error.is_retryable() {
                return Err(error);
            }
            attempt = attempt.saturating_add(1);
            warn!(operation, attempt, error = %error, "provider call failed, retrying");
        }
    }
}

/// Dwell, then move from `ShowFeedback` to the next turn or the end screen.
async fn finish_turn(shared: Arc<Shared>, pending: PendingAdvance, dwell: Duration) {
    tokio::time::sleep(dwell).await;

    let mut inner = shared.inner.lock().await;
    if inner.session != pending.session || inner.state.status != GameStatus::ShowFeedback {
        debug!(session = pending.session, "dropping stale dwell transition");
        return;
    }

    if pending.ends_game {
        inner.state.status = GameStatus::EndScreen;
        info!(
            session = pending.session,
            turn = inner.state.turn,
            "game over"
        );
    } else {
        inner.state.current_scenario = Some(pending.next_scenario);
        inner.state.turn = inner.state.turn.saturating_add(1);
        inner.state.feedback = None;
        inner.state.status = GameStatus::InProgress;
        debug!(session = pending.session, turn = inner.state.turn, "advanced to next turn");
    }
    inner.loading = false;
    inner.dwell = None;
    shared.publish(&inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StubProvider;

    #[test]
    fn start_screen_defaults() {
        let state = start_screen_state();
        assert_eq!(state.status, GameStatus::StartScreen);
        assert_eq!(state.turn, 0);
        assert_eq!(state.stats, DEFAULT_STATS);
        assert_eq!(state.language, Language::En);
        assert_eq!(state.difficulty, Difficulty::Normal);
        assert!(state.current_scenario.is_none());
        assert!(state.feedback.is_none());
    }

    #[tokio::test]
    async fn new_engine_publishes_start_screen() {
        let engine = TurnEngine::new(Arc::new(StubProvider::new()), EngineConfig::default());
        let view = engine.view();
        assert_eq!(view.state, start_screen_state());
        assert!(!view.loading);
        assert_eq!(view.session, 0);
    }

    #[tokio::test]
    async fn submit_before_start_is_ignored() {
        let engine = TurnEngine::new(Arc::new(StubProvider::new()), EngineConfig::default());
        let choice = Choice {
            id: 1,
            text: "anything".to_owned(),
        };
        assert_eq!(
            engine.submit_choice(&choice).await,
            SubmitOutcome::Ignored(IgnoreReason::NotInProgress)
        );
        assert_eq!(engine.state(), start_screen_state());
    }
}
