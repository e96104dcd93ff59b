//! The LLM-backed narrative provider.
//!
//! [`NarrativeService`] holds the prompt engine and, once a credential has
//! been supplied, an LLM backend. Until then every call fails with
//! [`ProviderError::Uninitialized`] and the engine plays on fallbacks.

use std::sync::Arc;

use teamsim_core::{NarrativeProvider, ProviderError, TurnRequest};
use teamsim_types::{Agent, Language, Scenario, TeamStats, TurnResult};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::BackendSettings;
use crate::credentials::validate_credential;
use crate::error::RunnerError;
use crate::llm::{LlmBackend, create_backend};
use crate::parse::{parse_scenario, parse_turn_result};
use crate::prompt::PromptEngine;

/// Narrative provider that renders prompts, calls an LLM, and parses replies.
pub struct NarrativeService {
    settings: BackendSettings,
    prompts: PromptEngine,
    backend: RwLock<Option<Arc<LlmBackend>>>,
}

impl NarrativeService {
    /// Create an uninitialized service.
    pub fn new(settings: BackendSettings, prompts: PromptEngine) -> Self {
        Self {
            settings,
            prompts,
            backend: RwLock::new(None),
        }
    }

    /// The backend this service is configured for.
    pub const fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Bind the service to a credential, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Credential`] if the credential fails local
    /// validation. The service is left unchanged in that case.
    pub async fn initialize(&self, credential: &str) -> Result<(), RunnerError> {
        let credential = validate_credential(credential)?;
        let backend = create_backend(&self.settings.with_api_key(credential));
        info!(
            backend = backend.name(),
            model = self.settings.model,
            "narrative service initialized"
        );
        *self.backend.write().await = Some(Arc::new(backend));
        Ok(())
    }

    /// Whether a credential has been supplied.
    pub async fn is_initialized(&self) -> bool {
        self.backend.read().await.is_some()
    }

    /// Drop the credential. Subsequent calls fail with `Uninitialized`.
    pub async fn reset(&self) {
        if self.backend.write().await.take().is_some() {
            info!("narrative service reset");
        }
    }

    /// Ask the backend whether it accepts the current credential.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Uninitialized`] without a credential,
    /// [`ProviderError::InvalidCredential`] if the backend answers 401 or
    /// 403, and [`ProviderError::Backend`] for any other failure.
    pub async fn verify(&self) -> Result<(), ProviderError> {
        let backend = self.backend().await?;
        backend.verify().await?;
        debug!(backend = backend.name(), "credential verified");
        Ok(())
    }

    async fn backend(&self) -> Result<Arc<LlmBackend>, ProviderError> {
        self.backend
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(ProviderError::Uninitialized)
    }
}

impl NarrativeProvider for NarrativeService {
    async fn fetch_opening_scenario(
        &self,
        team: &[Agent],
        stats: TeamStats,
        language: Language,
    ) -> Result<Scenario, ProviderError> {
        let backend = self.backend().await?;
        let prompt = self.prompts.render_opening(team, stats, language)?;
        debug!(backend = backend.name(), "requesting opening scenario");
        let raw = backend.complete(&prompt).await?;
        Ok(parse_scenario(&raw, team)?)
    }

    async fn fetch_turn_result(
        &self,
        request: &TurnRequest<'_>,
    ) -> Result<TurnResult, ProviderError> {
        let backend = self.backend().await?;
        let prompt = self.prompts.render_turn(request)?;
        debug!(
            backend = backend.name(),
            turn = request.turn,
            "requesting turn result"
        );
        let raw = backend.complete(&prompt).await?;
        Ok(parse_turn_result(&raw, request.team)?)
    }
}
