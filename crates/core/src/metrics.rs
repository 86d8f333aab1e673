//! Metric names and descriptions.
//!
//! Every counter and histogram the agent emits is named here; the executor
//! calls `metrics::counter!()` / `metrics::histogram!()` with these constants.
//! Without an installed recorder every call is a no-op.
//!
//! # Naming
//!
//! - prefix: `testbed_`
//! - suffix: `_total` (counter), `_seconds` (histogram)
//!
//! ```ignore
//! metrics::counter!(testbed_core::metrics::EXECUTOR_SUITE_ACTIONS_TOTAL,
//!     testbed_core::metrics::LABEL_ACTION => "EXECUTE_TEST").increment(1);
//! ```

// ─── Label keys ──────────────────────────────────────────────────────

/// Remote method name (`RegisterSuite`, `RegisterTestSetup`, ...)
pub const LABEL_METHOD: &str = "method";

/// success, failure
pub const LABEL_RESULT: &str = "result";

/// Suite action wire name
pub const LABEL_ACTION: &str = "action";

/// passed, failed, panicked, aborted
pub const LABEL_OUTCOME: &str = "outcome";

// ─── Label values ────────────────────────────────────────────────────

pub const RESULT_SUCCESS: &str = "success";
pub const RESULT_FAILURE: &str = "failure";

pub const OUTCOME_PASSED: &str = "passed";
pub const OUTCOME_FAILED: &str = "failed";
pub const OUTCOME_PANICKED: &str = "panicked";
pub const OUTCOME_ABORTED: &str = "aborted";

// ─── Executor metrics ────────────────────────────────────────────────

/// Registration attempts, including the successful one (counter)
pub const EXECUTOR_REGISTRATION_ATTEMPTS_TOTAL: &str =
    "testbed_executor_registration_attempts_total";

/// Remote calls (counter, labels: method, result)
pub const EXECUTOR_RPC_CALLS_TOTAL: &str = "testbed_executor_rpc_calls_total";

/// Suite actions dispatched (counter, label: action)
pub const EXECUTOR_SUITE_ACTIONS_TOTAL: &str = "testbed_executor_suite_actions_total";

/// Test runs by outcome (counter, label: outcome)
pub const EXECUTOR_TEST_RUNS_TOTAL: &str = "testbed_executor_test_runs_total";

/// Wall time of the test run routine (histogram, seconds)
pub const EXECUTOR_TEST_RUN_DURATION_SECONDS: &str =
    "testbed_executor_test_run_duration_seconds";

/// Registers HELP text for every metric.
///
/// Call once, after a recorder has been installed.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        EXECUTOR_REGISTRATION_ATTEMPTS_TOTAL,
        "Suite registration attempts made against the orchestrator"
    );
    describe_counter!(
        EXECUTOR_RPC_CALLS_TOTAL,
        "Orchestrator API calls by method and result"
    );
    describe_counter!(
        EXECUTOR_SUITE_ACTIONS_TOTAL,
        "Suite actions received from the orchestrator"
    );
    describe_counter!(EXECUTOR_TEST_RUNS_TOTAL, "Test runs by outcome");
    describe_histogram!(
        EXECUTOR_TEST_RUN_DURATION_SECONDS,
        "Duration of the test run routine in seconds"
    );
}
