//! CLI argument definitions for testbed-testsuite.
//!
//! Uses `clap` v4 derive macros. The orchestrator launches the binary with
//! `--api-socket` and `--params-json`; everything else has a default.

use std::path::PathBuf;

use clap::Parser;
use testbed_core::config::AgentConfig;
use testbed_core::error::{ConfigError, TestbedError};

/// Example test suite for the testbed orchestrator.
///
/// Registers with the orchestrator, then either describes its tests or runs
/// the one test the orchestrator names.
#[derive(Parser, Debug)]
#[command(name = "testbed-testsuite")]
#[command(version, about, long_about = None)]
pub struct TestsuiteCli {
    /// `host:port` of the orchestrator API.
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub api_socket: Option<String>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Suite-specific parameters as a JSON object.
    #[arg(long, default_value = "{}")]
    pub params_json: String,

    /// Optional testbed.toml configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl TestsuiteCli {
    /// Resolves the agent configuration.
    ///
    /// Precedence: CLI flags > `TESTBED_*` environment > config file > defaults.
    ///
    /// # Errors
    ///
    /// Fails if the config file cannot be read, a value is out of range, or
    /// no API socket was given anywhere.
    pub async fn resolve_config(&self) -> Result<AgentConfig, TestbedError> {
        let mut config = match &self.config {
            Some(path) => AgentConfig::from_file(path).await?,
            None => AgentConfig::default(),
        };
        config.apply_env_overrides();

        if let Some(socket) = &self.api_socket {
            config.orchestrator.api_socket.clone_from(socket);
        }
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }

        config.validate()?;

        if config.orchestrator.api_socket.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "orchestrator.api_socket".to_owned(),
                reason: "required (--api-socket, TESTBED_ORCHESTRATOR_API_SOCKET or config file)"
                    .to_owned(),
            }
            .into());
        }

        Ok(config)
    }
}
