//! Suite registration with bounded retries.
//!
//! Registration races the orchestrator's own startup, so every failure is
//! treated as transient: up to [`MAX_REGISTRATION_ATTEMPTS`] calls spaced
//! [`REGISTRATION_RETRY_DELAY`] apart (about ten seconds in total).

use std::time::Duration;

use testbed_core::metrics as m;
use testbed_core::types::SuiteRegistrationResponse;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{OrchestratorClient, method};
use crate::error::{ExecutorError, RpcError};
use crate::rpc;

/// Registration calls made before giving up.
pub const MAX_REGISTRATION_ATTEMPTS: u32 = 20;

/// Fixed pause between consecutive registration calls.
pub const REGISTRATION_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Registers the suite and returns the orchestrator's response.
///
/// There is no delay before the first attempt and none after a success.
///
/// # Errors
///
/// - `ExecutorError::RegistrationExhausted` after the last failed attempt,
///   carrying that attempt's error
/// - `ExecutorError::Cancelled` if `cancel` fires during a call or a pause
pub async fn register_suite<C: OrchestratorClient>(
    client: &C,
    cancel: &CancellationToken,
) -> Result<SuiteRegistrationResponse, ExecutorError> {
    let mut last_error: Option<RpcError> = None;

    for attempt in 1..=MAX_REGISTRATION_ATTEMPTS {
        if attempt > 1 {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return Err(ExecutorError::Cancelled { step: method::REGISTER_SUITE });
                }
                () = tokio::time::sleep(REGISTRATION_RETRY_DELAY) => {}
            }
        }

        metrics::counter!(m::EXECUTOR_REGISTRATION_ATTEMPTS_TOTAL).increment(1);

        match rpc::guarded(method::REGISTER_SUITE, cancel, client.register_suite()).await? {
            Ok(response) => {
                info!(attempt, "test suite registered");
                return Ok(response);
            }
            Err(e) => {
                debug!(
                    attempt,
                    max_attempts = MAX_REGISTRATION_ATTEMPTS,
                    error = %e,
                    "suite registration attempt failed, retrying"
                );
                last_error = Some(e);
            }
        }
    }

    Err(ExecutorError::RegistrationExhausted {
        attempts: MAX_REGISTRATION_ATTEMPTS,
        delay: REGISTRATION_RETRY_DELAY,
        last_error: last_error
            .unwrap_or_else(|| RpcError::Transport("no registration attempt made".to_owned())),
    })
}
