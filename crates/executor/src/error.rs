//! Execution agent error types.
//!
//! [`ExecutorError`] is the single error a [`TestSuiteExecutor`](crate::TestSuiteExecutor)
//! run reports. Every variant names the step or test that failed; nothing is
//! swallowed on the way up.

use std::time::Duration;

use testbed_core::error::{TestError, TestbedError};

/// Failure of a single orchestrator call.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The request never produced a response (refused, reset, timed out)
    #[error("transport error: {0}")]
    Transport(String),

    /// The orchestrator answered with a non-success status
    #[error("orchestrator returned status {code}: {message}")]
    Status { code: u16, message: String },

    /// The response body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Why a test's run routine did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum TestFault {
    /// The run routine returned an error
    #[error("{0}")]
    Error(#[source] TestError),

    /// The run routine panicked; carries the panic message
    #[error("test panicked: {0}")]
    Panic(String),

    /// The run task was cancelled before finishing, e.g. by runtime shutdown
    #[error("test run aborted: {0}")]
    Aborted(String),
}

/// Errors surfaced by the execution agent.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The orchestrator address cannot be turned into a client
    #[error("failed to create orchestrator client: {0}")]
    Connection(String),

    /// Every registration attempt failed
    #[error(
        "failed to register test suite after {attempts} attempts with {}ms between attempts: {last_error}",
        .delay.as_millis()
    )]
    RegistrationExhausted {
        attempts: u32,
        delay: Duration,
        last_error: RpcError,
    },

    /// The orchestrator asked for an action this agent does not know
    #[error(
        "unrecognized suite action '{0}'; this is an orchestrator/agent protocol mismatch"
    )]
    UnrecognizedAction(String),

    /// The orchestrator assigned a test that is not in the suite
    #[error("orchestrator assigned test '{0}' which is not in the test suite")]
    UnknownTest(String),

    /// A remote call outside registration failed
    #[error("{step} failed: {source}")]
    Rpc {
        step: &'static str,
        #[source]
        source: RpcError,
    },

    /// The test's setup routine returned an error
    #[error("setup of test '{test}' failed: {source}")]
    Setup {
        test: String,
        #[source]
        source: TestError,
    },

    /// The test's run routine failed or panicked
    #[error("test '{test}' failed: {fault}")]
    TestFailed {
        test: String,
        #[source]
        fault: TestFault,
    },

    /// The cancellation signal fired while waiting on the orchestrator
    #[error("cancelled during {step}")]
    Cancelled { step: &'static str },

    /// Logging or suite construction failed before connecting
    #[error("test suite configuration failed: {0}")]
    Configurator(#[from] TestbedError),
}

impl ExecutorError {
    /// Process exit status for this error.
    ///
    /// | code | meaning |
    /// |------|---------|
    /// | 1 | the test itself failed (setup error, run error, panic) |
    /// | 2 | configuration error |
    /// | 3 | orchestrator or protocol error |
    /// | 130 | cancelled |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Setup { .. } | Self::TestFailed { .. } => 1,
            Self::Configurator(_) | Self::Connection(_) => 2,
            Self::RegistrationExhausted { .. }
            | Self::UnrecognizedAction(_)
            | Self::UnknownTest(_)
            | Self::Rpc { .. } => 3,
            Self::Cancelled { .. } => 130,
        }
    }

    /// Whether the failure originated in user test code.
    pub fn is_test_failure(&self) -> bool {
        self.exit_code() == 1
    }
}
