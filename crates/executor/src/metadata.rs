//! Metadata flow: describe every test in the suite to the orchestrator.

use testbed_core::testsuite::TestSuite;
use testbed_core::types::{TestMetadata, TestSuiteMetadata};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::{OrchestratorClient, method};
use crate::error::ExecutorError;
use crate::rpc;

/// Builds the suite description from each test's declared configuration.
pub fn build_suite_metadata(suite: &dyn TestSuite) -> TestSuiteMetadata {
    let test_metadata = suite
        .tests()
        .into_iter()
        .map(|(name, test)| {
            let metadata = TestMetadata::from_configuration(&test.configuration());
            (name, metadata)
        })
        .collect();

    TestSuiteMetadata {
        test_metadata,
        network_width_bits: suite.network_width_bits(),
    }
}

/// Sends the suite description in one call. Failure is not retried.
pub async fn serialize_suite_metadata<C: OrchestratorClient>(
    client: &C,
    suite: &dyn TestSuite,
    cancel: &CancellationToken,
) -> Result<(), ExecutorError> {
    let metadata = build_suite_metadata(suite);
    let test_count = metadata.test_metadata.len();

    rpc::call(
        method::SERIALIZE_SUITE_METADATA,
        cancel,
        client.serialize_suite_metadata(&metadata),
    )
    .await?;

    info!(
        tests = test_count,
        network_width_bits = metadata.network_width_bits,
        "suite metadata serialized"
    );
    Ok(())
}
