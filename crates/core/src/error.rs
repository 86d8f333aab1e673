//! Error types shared by every testbed crate.

/// Top-level testbed error.
#[derive(Debug, thiserror::Error)]
pub enum TestbedError {
    /// Configuration loading or validation failure
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The global tracing subscriber could not be installed
    #[error("logging error: {0}")]
    Logging(String),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file does not exist
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// Config (TOML file or params JSON) could not be parsed
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// A field holds a value outside its allowed domain
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Errors produced by a test's setup or run routine.
///
/// This is the error type user test code returns. Panics are not represented
/// here; the executor catches those separately.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// Generic failure with a human-readable reason
    #[error("{0}")]
    Failed(String),

    /// A checked expectation did not hold
    #[error("assertion failed: expected {expected}, got {actual}")]
    Assertion { expected: String, actual: String },

    /// I/O failure while talking to the test network
    #[error("network io error: {0}")]
    Io(#[from] std::io::Error),

    /// The network handle passed to `run` is not the type `setup` produced
    #[error("network handle is not a '{expected}'")]
    NetworkTypeMismatch { expected: &'static str },
}

impl TestError {
    /// Shorthand for [`TestError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    /// Shorthand for [`TestError::Assertion`].
    pub fn assertion(expected: impl ToString, actual: impl ToString) -> Self {
        Self::Assertion {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_testbed_error() {
        let err: TestbedError = ConfigError::ParseFailed {
            reason: "bad toml".to_owned(),
        }
        .into();
        assert!(matches!(err, TestbedError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn invalid_value_display_names_field() {
        let err = ConfigError::InvalidValue {
            field: "general.log_level".to_owned(),
            reason: "must be one of: info".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("general.log_level"));
        assert!(msg.contains("must be one of"));
    }

    #[test]
    fn assertion_display_shows_both_sides() {
        let err = TestError::assertion(1, 2);
        assert_eq!(err.to_string(), "assertion failed: expected 1, got 2");
    }

    #[test]
    fn network_type_mismatch_display() {
        let err = TestError::NetworkTypeMismatch {
            expected: "EchoNetwork",
        };
        assert!(err.to_string().contains("EchoNetwork"));
    }

    #[test]
    fn io_error_converts_to_test_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: TestError = io.into();
        assert!(matches!(err, TestError::Io(_)));
    }
}
