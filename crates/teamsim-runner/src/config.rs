//! Configuration types for the narrative runner.
//!
//! Configuration is read from environment variables. The runner needs to
//! know which LLM backend to talk to and where its templates, credential
//! file, and engine tunables live. The credential itself is not part of the
//! configuration; it goes through the credential store.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::RunnerError;

/// Complete runner configuration loaded from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// The LLM backend the narrative service talks to.
    pub backend: BackendSettings,
    /// Directory whose templates override the built-in ones.
    pub templates_dir: Option<PathBuf>,
    /// Credential file location, if not the platform default.
    pub credentials_path: Option<PathBuf>,
    /// YAML file with engine tunables.
    pub engine_config_path: Option<PathBuf>,
    /// Credential to use when none is stored yet.
    pub seed_api_key: Option<String>,
}

/// Where to reach an LLM backend, minus the credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    /// The backend type.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// Model identifier (e.g. `gemini-2.5-flash`).
    pub model: String,
}

/// Configuration for a single LLM backend with its credential attached.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The backend type.
    pub backend_type: BackendType,
    /// Base API URL.
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
}

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendType {
    /// Google Gemini `generateContent` API.
    #[default]
    Gemini,
    /// `OpenAI`-compatible API (works with `OpenAI`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl BackendType {
    /// API base URL used when `TEAMSIM_API_URL` is unset.
    pub const fn default_api_url(self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    /// Model used when `TEAMSIM_MODEL` is unset.
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-flash",
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
        }
    }
}

impl FromStr for BackendType {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" | "deepseek" | "ollama" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(RunnerError::Config(format!("unknown backend type: {other}"))),
        }
    }
}

impl BackendSettings {
    /// Attach a credential, producing a full backend configuration.
    pub fn with_api_key(&self, api_key: &str) -> LlmBackendConfig {
        LlmBackendConfig {
            backend_type: self.backend_type,
            api_url: self.api_url.clone(),
            api_key: api_key.to_owned(),
            model: self.model.clone(),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        let backend_type = BackendType::default();
        Self {
            backend_type,
            api_url: backend_type.default_api_url().to_owned(),
            model: backend_type.default_model().to_owned(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `TEAMSIM_BACKEND` -- `gemini` (default), `openai`, or `anthropic`
    /// - `TEAMSIM_API_URL` -- API base URL (default depends on backend)
    /// - `TEAMSIM_MODEL` -- model name (default depends on backend)
    /// - `TEAMSIM_TEMPLATES_DIR` -- directory overriding built-in templates
    /// - `TEAMSIM_CREDENTIALS_PATH` -- credential file location
    /// - `TEAMSIM_ENGINE_CONFIG` -- YAML file with engine tunables
    /// - `TEAMSIM_API_KEY` -- credential used when none is stored
    pub fn from_env() -> Result<Self, RunnerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RunnerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let backend_type = var("TEAMSIM_BACKEND")
            .map(|v| v.parse::<BackendType>())
            .transpose()?
            .unwrap_or_default();
        let api_url = var("TEAMSIM_API_URL")
            .unwrap_or_else(|| backend_type.default_api_url().to_owned())
            .trim_end_matches('/')
            .to_owned();
        let model = var("TEAMSIM_MODEL").unwrap_or_else(|| backend_type.default_model().to_owned());

        Ok(Self {
            backend: BackendSettings {
                backend_type,
                api_url,
                model,
            },
            templates_dir: var("TEAMSIM_TEMPLATES_DIR").map(PathBuf::from),
            credentials_path: var("TEAMSIM_CREDENTIALS_PATH").map(PathBuf::from),
            engine_config_path: var("TEAMSIM_ENGINE_CONFIG").map(PathBuf::from),
            seed_api_key: var("TEAMSIM_API_KEY"),
        })
    }
}
