//! Execution flow: run the single test the orchestrator assigns.
//!
//! ```text
//! GetTestExecutionInfo -> resolve test -> RegisterTestSetup -> setup()
//!     -> RegisterTestSetupCompletion -> RegisterTestExecution -> run() (isolated)
//! ```
//!
//! Steps are strictly sequential; each acknowledgement must complete before
//! the next state is entered. Setup runs on the flow's own task, so a setup
//! panic is not isolated.

use std::sync::Arc;
use std::time::Instant;

use testbed_core::metrics as m;
use testbed_core::testsuite::{NetworkContext, TestSuite};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};

use crate::client::{OrchestratorClient, method};
use crate::error::{ExecutorError, TestFault};
use crate::isolation::run_in_isolation;
use crate::rpc;

/// Fetches the assigned test, drives its setup and run, and reports progress.
///
/// # Errors
///
/// - `ExecutorError::UnknownTest` before any acknowledgement if the assigned
///   name is not in the suite
/// - `ExecutorError::Rpc` if any call fails
/// - `ExecutorError::Setup` if setup returns an error
/// - `ExecutorError::TestFailed` if the run routine errors or panics
/// - `ExecutorError::Cancelled` if `cancel` fires while a call is in flight
pub async fn execute_test<C: OrchestratorClient>(
    client: &C,
    suite: &dyn TestSuite,
    cancel: &CancellationToken,
) -> Result<(), ExecutorError> {
    let info = rpc::call(
        method::GET_TEST_EXECUTION_INFO,
        cancel,
        client.get_test_execution_info(),
    )
    .await?;
    let test_name = info.test_name;

    let mut tests = suite.tests();
    let test = tests
        .remove(&test_name)
        .ok_or_else(|| ExecutorError::UnknownTest(test_name.clone()))?;
    let configuration = test.configuration();

    async {
        rpc::call(method::REGISTER_TEST_SETUP, cancel, client.register_test_setup()).await?;

        info!("setting up test network");
        let ctx = NetworkContext::new(configuration.files_artifact_urls);
        let network = test
            .setup(ctx)
            .await
            .map_err(|source| ExecutorError::Setup {
                test: test_name.clone(),
                source,
            })?;
        info!("test network set up");

        rpc::call(
            method::REGISTER_TEST_SETUP_COMPLETION,
            cancel,
            client.register_test_setup_completion(),
        )
        .await?;
        rpc::call(
            method::REGISTER_TEST_EXECUTION,
            cancel,
            client.register_test_execution(),
        )
        .await?;

        info!("running test");
        let started = Instant::now();
        let result = run_in_isolation(Arc::clone(&test), Arc::new(network)).await;
        metrics::histogram!(m::EXECUTOR_TEST_RUN_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        let outcome = match &result {
            Ok(()) => m::OUTCOME_PASSED,
            Err(TestFault::Error(_)) => m::OUTCOME_FAILED,
            Err(TestFault::Panic(_)) => m::OUTCOME_PANICKED,
            Err(TestFault::Aborted(_)) => m::OUTCOME_ABORTED,
        };
        metrics::counter!(m::EXECUTOR_TEST_RUNS_TOTAL, m::LABEL_OUTCOME => outcome).increment(1);

        match result {
            Ok(()) => {
                info!("test passed");
                Ok(())
            }
            Err(fault) => {
                warn!(error = %fault, "test failed");
                Err(ExecutorError::TestFailed {
                    test: test_name.clone(),
                    fault,
                })
            }
        }
    }
    .instrument(info_span!("test", test = %test_name))
    .await
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::client::MockOrchestratorClient;
    use crate::error::RpcError;
    use testbed_core::error::TestError;
    use testbed_core::testsuite::{DynTest, Test, TestContext};
    use testbed_core::types::{FilesArtifactId, SuiteAction, TestConfigurationBuilder};

    #[derive(Clone, Copy)]
    enum RunBehaviour {
        Pass,
        Fail,
        Panic,
    }

    struct ProbeTest {
        setup_fails: bool,
        run: RunBehaviour,
    }

    struct ProbeNetwork {
        artifact_url: Option<String>,
    }

    impl Test for ProbeTest {
        type Network = ProbeNetwork;

        fn configure(&self, builder: &mut TestConfigurationBuilder) {
            builder.with_files_artifact_url("seed", "https://example.com/seed.tgz");
        }

        async fn setup(&self, ctx: NetworkContext) -> Result<ProbeNetwork, TestError> {
            if self.setup_fails {
                return Err(TestError::failed("could not start node"));
            }
            Ok(ProbeNetwork {
                artifact_url: ctx
                    .files_artifact_url(&FilesArtifactId::new("seed"))
                    .map(str::to_owned),
            })
        }

        async fn run(&self, network: &ProbeNetwork, _ctx: TestContext) -> Result<(), TestError> {
            match self.run {
                RunBehaviour::Pass if network.artifact_url.is_some() => Ok(()),
                RunBehaviour::Pass => Err(TestError::failed("artifact url missing")),
                RunBehaviour::Fail => Err(TestError::failed("echo mismatch")),
                RunBehaviour::Panic => panic!("boom"),
            }
        }
    }

    struct ProbeSuite {
        setup_fails: bool,
        run: RunBehaviour,
    }

    impl TestSuite for ProbeSuite {
        fn tests(&self) -> BTreeMap<String, Arc<dyn DynTest>> {
            let mut tests: BTreeMap<String, Arc<dyn DynTest>> = BTreeMap::new();
            tests.insert(
                "probe".to_owned(),
                Arc::new(ProbeTest {
                    setup_fails: self.setup_fails,
                    run: self.run,
                }),
            );
            tests
        }

        fn network_width_bits(&self) -> u32 {
            8
        }
    }

    fn suite(run: RunBehaviour) -> ProbeSuite {
        ProbeSuite {
            setup_fails: false,
            run,
        }
    }

    fn client() -> MockOrchestratorClient {
        MockOrchestratorClient::new(SuiteAction::ExecuteTest).with_test_name("probe")
    }

    const FULL_SEQUENCE: [&str; 4] = [
        method::GET_TEST_EXECUTION_INFO,
        method::REGISTER_TEST_SETUP,
        method::REGISTER_TEST_SETUP_COMPLETION,
        method::REGISTER_TEST_EXECUTION,
    ];

    #[tokio::test]
    async fn passing_test_sends_acknowledgements_in_order() {
        let client = client();
        execute_test(&client, &suite(RunBehaviour::Pass), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(client.calls(), FULL_SEQUENCE);
    }

    #[tokio::test]
    async fn unknown_test_fails_before_any_acknowledgement() {
        let client = MockOrchestratorClient::new(SuiteAction::ExecuteTest).with_test_name("ghost");
        let err = execute_test(&client, &suite(RunBehaviour::Pass), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutorError::UnknownTest(ref name) if name == "ghost"));
        assert_eq!(client.calls(), vec![method::GET_TEST_EXECUTION_INFO]);
    }

    #[tokio::test]
    async fn panicking_run_is_test_failure_after_all_acknowledgements() {
        let client = client();
        let err = execute_test(&client, &suite(RunBehaviour::Panic), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            ExecutorError::TestFailed {
                test,
                fault: TestFault::Panic(message),
            } => {
                assert_eq!(test, "probe");
                assert_eq!(message, "boom");
            }
            other => panic!("expected panic fault, got {other:?}"),
        }
        assert_eq!(client.calls(), FULL_SEQUENCE);
    }

    #[tokio::test]
    async fn failing_run_is_test_failure() {
        let client = client();
        let err = execute_test(&client, &suite(RunBehaviour::Fail), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::TestFailed {
                fault: TestFault::Error(_),
                ..
            }
        ));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn setup_error_stops_before_completion_acknowledgement() {
        let client = client();
        let suite = ProbeSuite {
            setup_fails: true,
            run: RunBehaviour::Pass,
        };
        let err = execute_test(&client, &suite, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutorError::Setup { ref test, .. } if test == "probe"));
        assert_eq!(
            client.calls(),
            vec![method::GET_TEST_EXECUTION_INFO, method::REGISTER_TEST_SETUP]
        );
    }

    #[tokio::test]
    async fn failed_acknowledgement_is_fatal_and_stops_the_flow() {
        let client = client().with_failing_method(method::REGISTER_TEST_SETUP_COMPLETION);
        let err = execute_test(&client, &suite(RunBehaviour::Pass), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExecutorError::Rpc {
                step: "RegisterTestSetupCompletion",
                source: RpcError::Status { .. }
            }
        ));
        assert_eq!(client.calls(), &FULL_SEQUENCE[..3]);
    }

    #[tokio::test]
    async fn assignment_failure_is_fatal() {
        let client = client().with_failing_method(method::GET_TEST_EXECUTION_INFO);
        let err = execute_test(&client, &suite(RunBehaviour::Pass), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::Rpc {
                step: "GetTestExecutionInfo",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn cancelled_before_start_makes_no_progress() {
        let client = client();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = execute_test(&client, &suite(RunBehaviour::Pass), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::Cancelled {
                step: "GetTestExecutionInfo"
            }
        ));
        assert!(client.calls().is_empty());
    }
}
