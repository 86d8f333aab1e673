//! Agent configuration -- `testbed.toml` parsing and runtime settings.
//!
//! [`AgentConfig`] holds everything the execution agent needs before it can
//! talk to the orchestrator.
//!
//! # Loading precedence
//! 1. CLI flags (applied by the binary)
//! 2. Environment variables (`TESTBED_ORCHESTRATOR_API_SOCKET=10.0.0.2:7443`)
//! 3. Config file (`testbed.toml`)
//! 4. Defaults
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), testbed_core::error::TestbedError> {
//! use testbed_core::config::AgentConfig;
//!
//! let config = AgentConfig::load("testbed.toml").await?;
//! let config = AgentConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, TestbedError};

const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

/// Accepted `general.log_level` values.
pub const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Accepted `general.log_format` values.
pub const VALID_LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// Root of `testbed.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

impl AgentConfig {
    /// Loads a TOML file, applies environment overrides, then validates.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TestbedError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file without environment overrides.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TestbedError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TestbedError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                TestbedError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// Parses a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, TestbedError> {
        toml::from_str(toml_str).map_err(|e| {
            TestbedError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Overrides fields from `TESTBED_{SECTION}_{FIELD}` environment variables.
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "TESTBED_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "TESTBED_GENERAL_LOG_FORMAT");

        override_string(
            &mut self.orchestrator.api_socket,
            "TESTBED_ORCHESTRATOR_API_SOCKET",
        );
        override_u64(
            &mut self.orchestrator.request_timeout_secs,
            "TESTBED_ORCHESTRATOR_REQUEST_TIMEOUT_SECS",
        );
    }

    /// Validates field domains.
    ///
    /// An empty `api_socket` is accepted here because the binary may still
    /// receive it from the command line; the executor rejects it when dialing.
    pub fn validate(&self) -> Result<(), TestbedError> {
        validate_log_level(&self.general.log_level)?;

        if !VALID_LOG_FORMATS.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_FORMATS.join(", ")),
            }
            .into());
        }

        let timeout = self.orchestrator.request_timeout_secs;
        if timeout == 0 || timeout > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "orchestrator.request_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_REQUEST_TIMEOUT_SECS}"),
            }
            .into());
        }

        Ok(())
    }
}

/// Checks a log level string against [`VALID_LOG_LEVELS`].
pub fn validate_log_level(level: &str) -> Result<(), TestbedError> {
    if VALID_LOG_LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: "general.log_level".to_owned(),
            reason: format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
        }
        .into())
    }
}

/// `[general]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// trace, debug, info, warn, error
    pub log_level: String,
    /// json, pretty
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// `[orchestrator]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// `host:port` of the orchestrator API
    pub api_socket: String,
    /// Per-request timeout for every remote call
    pub request_timeout_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            api_socket: String::new(),
            request_timeout_secs: 30,
        }
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
