//! Engine configuration and its YAML loader.
//!
//! Every field has a default matching the reference game: five turns, a
//! four second feedback dwell, and no provider retries. A YAML file only
//! needs to name the values it changes.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parsed but are not usable.
    #[error("invalid engine configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Tunables of the turn engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Number of playable turns. Turn `max_turns` is the last one.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// How long feedback stays on screen before the engine advances.
    #[serde(default = "default_feedback_dwell_ms")]
    pub feedback_dwell_ms: u64,

    /// Deadline for a single narrative provider call.
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,

    /// Extra attempts after a failed provider call before falling back.
    ///
    /// Zero keeps the reference behaviour: one failure ends in the fallback,
    /// and a turn fallback ends the game.
    #[serde(default)]
    pub provider_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            feedback_dwell_ms: default_feedback_dwell_ms(),
            provider_timeout_ms: default_provider_timeout_ms(),
            provider_retries: 0,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if the values fail validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] or [`ConfigError::Invalid`].
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `max_turns` or the provider
    /// timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turns == 0 {
            return Err(ConfigError::Invalid {
                reason: "max_turns must be at least 1".to_owned(),
            });
        }
        if self.provider_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "provider_timeout_ms must be positive".to_owned(),
            });
        }
        Ok(())
    }

    /// The feedback dwell as a [`Duration`].
    pub const fn feedback_dwell(&self) -> Duration {
        Duration::from_millis(self.feedback_dwell_ms)
    }

    /// The provider deadline as a [`Duration`].
    pub const fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

const fn default_max_turns() -> u32 {
    5
}

const fn default_feedback_dwell_ms() -> u64 {
    4000
}

const fn default_provider_timeout_ms() -> u64 {
    30_000
}
