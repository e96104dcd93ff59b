//! Error types for the narrative runner.
//!
//! Uses `thiserror` for typed errors that surface through the whole runner
//! pipeline: configuration, credential storage, prompt rendering, LLM calls,
//! and response parsing. When the engine is the caller, errors are folded
//! into [`ProviderError`] so the engine can fall back.

use teamsim_core::ProviderError;
use teamsim_types::ContractViolation;

/// Errors that can occur during runner operation.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Failed to render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// The credential failed local validation or was rejected upstream.
    #[error("invalid credential: {0}")]
    Credential(String),

    /// The LLM response could not be decoded.
    #[error("response parse error: {0}")]
    Parse(String),

    /// The LLM response decoded but breaks the provider contract.
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),

    /// Reading or writing a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<RunnerError> for ProviderError {
    fn from(error: RunnerError) -> Self {
        match error {
            RunnerError::Credential(reason) => Self::InvalidCredential { reason },
            RunnerError::Parse(message) => Self::Parse(message),
            RunnerError::Serde(e) => Self::Parse(e.to_string()),
            RunnerError::Contract(violation) => Self::Contract(violation),
            other @ (RunnerError::Config(_)
            | RunnerError::Template(_)
            | RunnerError::LlmBackend(_)
            | RunnerError::Io(_)) => Self::Backend(other.to_string()),
        }
    }
}
