//! Logging initialization for the execution agent.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either a
//! JSON or a human-readable fmt layer. `RUST_LOG`, when set, wins over the
//! level passed in.

use testbed_core::config::{VALID_LOG_FORMATS, validate_log_level};
use testbed_core::error::{ConfigError, TestbedError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// Call once, before the executor runs. A second call returns
/// `TestbedError::Logging` instead of panicking.
///
/// # Formats
///
/// * `"json"` - JSON lines
/// * `"pretty"` - multi-line human-readable output
pub fn init_tracing(log_level: &str, log_format: &str) -> Result<(), TestbedError> {
    validate_log_level(log_level)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    match log_format {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| {
                TestbedError::Logging(format!("failed to initialize JSON tracing subscriber: {e}"))
            }),
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
            .map_err(|e| {
                TestbedError::Logging(format!(
                    "failed to initialize pretty tracing subscriber: {e}"
                ))
            }),
        other => Err(ConfigError::InvalidValue {
            field: "general.log_format".to_owned(),
            reason: format!(
                "unknown log format '{other}', expected one of: {}",
                VALID_LOG_FORMATS.join(", ")
            ),
        }
        .into()),
    }
}
