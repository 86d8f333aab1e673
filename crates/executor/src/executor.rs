//! Top-level entry point of an execution agent process.
//!
//! [`TestSuiteExecutor`] wires a suite author's [`TestSuiteConfigurator`] to
//! the orchestrator protocol:
//!
//! 1. configurator initialises logging, metrics are described
//! 2. configurator parses the params JSON into a suite
//! 3. an [`HttpOrchestratorClient`] is built for the API socket
//! 4. [`run_with_client`]: register, dispatch, run one flow
//!
//! # Example
//!
//! ```ignore
//! let executor = TestSuiteExecutor::new(api_socket, "info", params_json, MyConfigurator);
//! let cancel = CancellationToken::new();
//! if let Err(e) = executor.run(cancel).await {
//!     std::process::exit(e.exit_code());
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use testbed_core::error::TestbedError;
use testbed_core::testsuite::TestSuite;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::client::{HttpOrchestratorClient, OrchestratorClient};
use crate::dispatch::dispatch;
use crate::error::ExecutorError;
use crate::registration::register_suite;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Suite-specific hooks the executor calls before connecting.
pub trait TestSuiteConfigurator: Send + Sync {
    /// Installs logging at `log_level`.
    fn init_logging(&self, log_level: &str) -> Result<(), TestbedError>;

    /// Builds the suite from the params JSON the orchestrator passed to the process.
    fn parse_params_and_create_suite(
        &self,
        params_json: &str,
    ) -> Result<Arc<dyn TestSuite>, TestbedError>;
}

/// Runs one agent process end to end.
pub struct TestSuiteExecutor {
    api_socket: String,
    log_level: String,
    params_json: String,
    request_timeout: Duration,
    configurator: Box<dyn TestSuiteConfigurator>,
}

impl TestSuiteExecutor {
    pub fn new(
        api_socket: impl Into<String>,
        log_level: impl Into<String>,
        params_json: impl Into<String>,
        configurator: impl TestSuiteConfigurator + 'static,
    ) -> Self {
        Self {
            api_socket: api_socket.into(),
            log_level: log_level.into(),
            params_json: params_json.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            configurator: Box::new(configurator),
        }
    }

    /// Per-call timeout on the orchestrator channel. Defaults to 30 seconds.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Configures, connects and runs exactly one flow.
    ///
    /// # Errors
    ///
    /// - `ExecutorError::Configurator` if logging or suite creation fails
    /// - `ExecutorError::Connection` if the API socket is unusable
    /// - anything [`run_with_client`] returns
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ExecutorError> {
        self.configurator.init_logging(&self.log_level)?;
        testbed_core::metrics::describe_all();
        let suite = self
            .configurator
            .parse_params_and_create_suite(&self.params_json)?;

        let client = HttpOrchestratorClient::connect(&self.api_socket, self.request_timeout)?;
        info!(api_socket = self.api_socket.as_str(), "orchestrator client created");

        run_with_client(&client, suite.as_ref(), &cancel).await
    }
}

/// Registers with the orchestrator and runs the flow it asks for.
///
/// Every call of this function is tagged with a fresh `execution_id`.
pub async fn run_with_client<C: OrchestratorClient>(
    client: &C,
    suite: &dyn TestSuite,
    cancel: &CancellationToken,
) -> Result<(), ExecutorError> {
    let execution_id = Uuid::new_v4();

    async {
        let response = register_suite(client, cancel).await?;
        dispatch(&response, client, suite, cancel).await?;
        info!("suite execution completed");
        Ok::<(), ExecutorError>(())
    }
    .instrument(info_span!("suite_execution", execution_id = %execution_id))
    .await
}
