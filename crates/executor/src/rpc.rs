//! Cancellation and accounting around single orchestrator calls.

use std::future::Future;

use testbed_core::metrics as m;
use tokio_util::sync::CancellationToken;

use crate::error::{ExecutorError, RpcError};

/// Races `request` against `cancel` and counts the outcome.
///
/// The outer `Err` is cancellation; the inner result is the call's own.
pub(crate) async fn guarded<T>(
    method: &'static str,
    cancel: &CancellationToken,
    request: impl Future<Output = Result<T, RpcError>>,
) -> Result<Result<T, RpcError>, ExecutorError> {
    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(ExecutorError::Cancelled { step: method }),
        result = request => result,
    };

    let outcome = if result.is_ok() {
        m::RESULT_SUCCESS
    } else {
        m::RESULT_FAILURE
    };
    metrics::counter!(
        m::EXECUTOR_RPC_CALLS_TOTAL,
        m::LABEL_METHOD => method,
        m::LABEL_RESULT => outcome
    )
    .increment(1);

    Ok(result)
}

/// A call whose failure is fatal: the error is wrapped with the method name.
pub(crate) async fn call<T>(
    method: &'static str,
    cancel: &CancellationToken,
    request: impl Future<Output = Result<T, RpcError>>,
) -> Result<T, ExecutorError> {
    guarded(method, cancel, request)
        .await?
        .map_err(|source| ExecutorError::Rpc {
            step: method,
            source,
        })
}
