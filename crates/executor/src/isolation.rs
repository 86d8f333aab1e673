//! Fault-isolating runner for a test's run routine.
//!
//! The run routine executes on its own tokio task. A panic inside it unwinds
//! only that task; the join handle hands the payload back and it becomes a
//! [`TestFault::Panic`]. The caller always receives exactly one result.
//!
//! No timeout is applied here. The orchestrator enforces the run timeout it
//! was told about through `RegisterTestExecution`.

use std::any::Any;
use std::sync::Arc;

use testbed_core::testsuite::{DynTest, NetworkHandle, TestContext};
use tokio::task::JoinError;
use tracing::{debug, trace};

use crate::error::TestFault;

const NON_STRING_PANIC_PAYLOAD: &str = "non-string panic payload";

/// Runs `test` against `network` on a separate task and waits for it.
///
/// Returns `Ok(())` when the run routine returns normally.
///
/// # Errors
///
/// - `TestFault::Error` if the run routine returned an error
/// - `TestFault::Panic` if it panicked
/// - `TestFault::Aborted` if its task was cancelled before finishing
pub async fn run_in_isolation(
    test: Arc<dyn DynTest>,
    network: Arc<NetworkHandle>,
) -> Result<(), TestFault> {
    let handle = tokio::spawn(async move { test.run(&network, TestContext::default()).await });

    match handle.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(TestFault::Error(e)),
        Err(join_error) => Err(fault_from_join_error(join_error)),
    }
}

/// A panicked task becomes `Panic`; a cancelled one becomes `Aborted`.
fn fault_from_join_error(join_error: JoinError) -> TestFault {
    if join_error.is_panic() {
        let message = panic_message(join_error.into_panic());
        debug!(panic = message.as_str(), "caught panic in test run");
        TestFault::Panic(message)
    } else {
        trace!(error = %join_error, "test run task did not complete");
        TestFault::Aborted(join_error.to_string())
    }
}

/// Extracts the message of a `panic!` payload.
fn panic_message(payload: Box<dyn Any + Send + 'static>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_owned(),
            Err(_) => NON_STRING_PANIC_PAYLOAD.to_owned(),
        },
    }
}
