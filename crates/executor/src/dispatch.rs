//! Routes the registration response to exactly one flow.

use testbed_core::metrics as m;
use testbed_core::testsuite::TestSuite;
use testbed_core::types::{SuiteAction, SuiteRegistrationResponse};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::OrchestratorClient;
use crate::error::ExecutorError;
use crate::execution::execute_test;
use crate::metadata::serialize_suite_metadata;

/// Runs the metadata flow or the execution flow.
///
/// An action this agent does not recognise means the agent and orchestrator
/// disagree on the protocol; it fails without running either flow.
pub async fn dispatch<C: OrchestratorClient>(
    response: &SuiteRegistrationResponse,
    client: &C,
    suite: &dyn TestSuite,
    cancel: &CancellationToken,
) -> Result<(), ExecutorError> {
    let action = SuiteAction::from_wire(&response.suite_action)
        .ok_or_else(|| ExecutorError::UnrecognizedAction(response.suite_action.clone()))?;

    metrics::counter!(m::EXECUTOR_SUITE_ACTIONS_TOTAL, m::LABEL_ACTION => action.as_wire())
        .increment(1);
    info!(action = %action, "dispatching suite action");

    match action {
        SuiteAction::SerializeSuiteMetadata => {
            serialize_suite_metadata(client, suite, cancel).await
        }
        SuiteAction::ExecuteTest => execute_test(client, suite, cancel).await,
    }
}
