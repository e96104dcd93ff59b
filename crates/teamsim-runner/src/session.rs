//! Ties the credential lifecycle to the narrative service and the engine.

use std::sync::Arc;

use teamsim_core::{EngineConfig, ProviderError, TurnEngine};
use tracing::{info, warn};

use crate::credentials::{CredentialStore, validate_credential};
use crate::error::RunnerError;
use crate::service::NarrativeService;

/// A player session: one engine, one narrative service, one credential store.
pub struct Session {
    engine: TurnEngine<NarrativeService>,
    credentials: CredentialStore,
}

impl Session {
    /// Assemble a session. The service is not initialized here.
    pub fn new(
        service: Arc<NarrativeService>,
        credentials: CredentialStore,
        config: EngineConfig,
    ) -> Self {
        Self {
            engine: TurnEngine::new(service, config),
            credentials,
        }
    }

    /// The turn engine.
    pub const fn engine(&self) -> &TurnEngine<NarrativeService> {
        &self.engine
    }

    /// The narrative service.
    pub fn service(&self) -> &NarrativeService {
        self.engine.provider()
    }

    /// The credential store.
    pub const fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Whether the service has a credential and the game can be played.
    pub async fn is_ready(&self) -> bool {
        self.service().is_initialized().await
    }

    /// Initialize the service from the stored credential, if there is one.
    ///
    /// A stored credential that fails validation is removed so the player
    /// is asked for a new one. Returns whether the service is ready.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the credential file cannot be read or
    /// cleared.
    pub async fn resume(&self) -> Result<bool, RunnerError> {
        let Some(stored) = self.credentials.load()? else {
            return Ok(false);
        };
        match self.service().initialize(&stored).await {
            Ok(()) => {
                info!("resumed with stored credential");
                Ok(true)
            }
            Err(RunnerError::Credential(reason)) => {
                warn!(%reason, "stored credential rejected, clearing it");
                self.credentials.clear()?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Validate a credential, initialize the service with it, and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Credential`] if validation fails, in which case
    /// nothing is stored, or an I/O error if persisting fails, in which case
    /// the service is reset.
    pub async fn submit_credential(&self, raw: &str) -> Result<(), RunnerError> {
        let credential = validate_credential(raw)?;
        self.service().initialize(credential).await?;
        if let Err(e) = self.credentials.save(credential) {
            self.service().reset().await;
            return Err(e);
        }
        Ok(())
    }

    /// Ask the backend whether it accepts the credential.
    ///
    /// A rejected credential is cleared like [`Session::clear_credential`].
    /// Other failures (network, quota) keep the credential.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Credential`] if the backend rejected it.
    pub async fn verify_credential(&self) -> Result<(), RunnerError> {
        match self.service().verify().await {
            Ok(()) => Ok(()),
            Err(ProviderError::InvalidCredential { reason }) => {
                warn!(%reason, "backend rejected credential");
                self.clear_credential().await?;
                Err(RunnerError::Credential(reason))
            }
            Err(e) => {
                warn!(error = %e, "could not verify credential, keeping it");
                Ok(())
            }
        }
    }

    /// Forget the credential and return the engine to the start screen.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the credential file cannot be cleared.
    /// The service is reset and the engine restarted regardless.
    pub async fn clear_credential(&self) -> Result<(), RunnerError> {
        let cleared = self.credentials.clear();
        self.service().reset().await;
        self.engine.restart().await;
        cleared
    }
}
