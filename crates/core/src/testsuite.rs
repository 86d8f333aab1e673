//! Test-suite abstractions -- what a suite author implements.
//!
//! [`Test`] is the static, async-fn-in-trait interface a test author writes.
//! Because it has an associated `Network` type and RPITIT methods it cannot be
//! used as `dyn Test`; [`DynTest`] is the dyn-compatible mirror that erases
//! the network type into a [`NetworkHandle`]. Every `Test` gets `DynTest`
//! for free.
//!
//! # Lifecycle of one test run
//! ```text
//! configure() -> setup(NetworkContext) -> Network -> run(&Network, TestContext)
//! ```
//!
//! # Example
//! ```ignore
//! struct PingTest;
//!
//! impl Test for PingTest {
//!     type Network = PingNetwork;
//!
//!     fn configure(&self, builder: &mut TestConfigurationBuilder) {
//!         builder.with_setup_timeout_secs(60).with_run_timeout_secs(30);
//!     }
//!
//!     async fn setup(&self, ctx: NetworkContext) -> Result<PingNetwork, TestError> {
//!         PingNetwork::start(&ctx).await
//!     }
//!
//!     async fn run(&self, network: &PingNetwork, _ctx: TestContext) -> Result<(), TestError> {
//!         network.ping_all().await
//!     }
//! }
//! ```

use std::any::{Any, type_name};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::TestError;
use crate::types::{FilesArtifactId, TestConfiguration, TestConfigurationBuilder};

/// Boxed future returned by the dyn-compatible traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased network produced by a test's setup routine.
///
/// The executor owns it for the rest of the flow and never looks inside.
pub type NetworkHandle = Box<dyn Any + Send + Sync>;

// ─── Contexts ────────────────────────────────────────────────────────

/// Context handed to a test's setup routine.
#[derive(Debug, Clone, Default)]
pub struct NetworkContext {
    files_artifact_urls: HashMap<FilesArtifactId, String>,
}

impl NetworkContext {
    pub fn new(files_artifact_urls: HashMap<FilesArtifactId, String>) -> Self {
        Self {
            files_artifact_urls,
        }
    }

    /// URL of a declared files artifact.
    pub fn files_artifact_url(&self, id: &FilesArtifactId) -> Option<&str> {
        self.files_artifact_urls.get(id).map(String::as_str)
    }

    pub fn files_artifact_urls(&self) -> &HashMap<FilesArtifactId, String> {
        &self.files_artifact_urls
    }
}

/// Context handed to a test's run routine. Carries nothing yet.
#[derive(Debug, Clone, Default)]
pub struct TestContext {}

// ─── Test ────────────────────────────────────────────────────────────

/// A single test.
pub trait Test: Send + Sync + 'static {
    /// Network topology built by `setup` and consumed by `run`.
    type Network: Send + Sync + 'static;

    /// Declares timeouts, partitioning and files artifacts.
    fn configure(&self, builder: &mut TestConfigurationBuilder);

    /// Builds the test network.
    fn setup(
        &self,
        ctx: NetworkContext,
    ) -> impl Future<Output = Result<Self::Network, TestError>> + Send;

    /// Exercises the network. Returning `Err` or panicking fails the test.
    fn run(
        &self,
        network: &Self::Network,
        ctx: TestContext,
    ) -> impl Future<Output = Result<(), TestError>> + Send;
}

// ─── DynTest ─────────────────────────────────────────────────────────

/// dyn-compatible view of a [`Test`].
pub trait DynTest: Send + Sync {
    /// Runs `configure` against a fresh builder.
    fn configuration(&self) -> TestConfiguration;

    fn setup(&self, ctx: NetworkContext) -> BoxFuture<'_, Result<NetworkHandle, TestError>>;

    fn run<'a>(
        &'a self,
        network: &'a NetworkHandle,
        ctx: TestContext,
    ) -> BoxFuture<'a, Result<(), TestError>>;
}

impl<T: Test> DynTest for T {
    fn configuration(&self) -> TestConfiguration {
        let mut builder = TestConfigurationBuilder::new();
        Test::configure(self, &mut builder);
        builder.build()
    }

    fn setup(&self, ctx: NetworkContext) -> BoxFuture<'_, Result<NetworkHandle, TestError>> {
        Box::pin(async move {
            let network = Test::setup(self, ctx).await?;
            Ok(Box::new(network) as NetworkHandle)
        })
    }

    fn run<'a>(
        &'a self,
        network: &'a NetworkHandle,
        ctx: TestContext,
    ) -> BoxFuture<'a, Result<(), TestError>> {
        Box::pin(async move {
            let network = network.downcast_ref::<T::Network>().ok_or(
                TestError::NetworkTypeMismatch {
                    expected: type_name::<T::Network>(),
                },
            )?;
            Test::run(self, network, ctx).await
        })
    }
}

// ─── TestSuite ───────────────────────────────────────────────────────

/// A named collection of tests.
pub trait TestSuite: Send + Sync {
    /// Test name -> test.
    fn tests(&self) -> BTreeMap<String, Arc<dyn DynTest>>;

    /// Width, in bits, of the network the orchestrator allocates per test.
    fn network_width_bits(&self) -> u32;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CounterNetwork {
        value: u32,
    }

    struct CounterTest {
        expected: u32,
    }

    impl Test for CounterTest {
        type Network = CounterNetwork;

        fn configure(&self, builder: &mut TestConfigurationBuilder) {
            builder
                .with_partitioning_enabled(true)
                .with_setup_timeout_secs(5)
                .with_run_timeout_secs(6);
        }

        async fn setup(&self, ctx: NetworkContext) -> Result<CounterNetwork, TestError> {
            Ok(CounterNetwork {
                value: u32::try_from(ctx.files_artifact_urls().len()).unwrap_or(u32::MAX),
            })
        }

        async fn run(&self, network: &CounterNetwork, _ctx: TestContext) -> Result<(), TestError> {
            if network.value == self.expected {
                Ok(())
            } else {
                Err(TestError::assertion(self.expected, network.value))
            }
        }
    }

    fn artifact_context(count: usize) -> NetworkContext {
        let urls = (0..count)
            .map(|i| (FilesArtifactId::new(format!("a{i}")), format!("https://x/{i}")))
            .collect();
        NetworkContext::new(urls)
    }

    #[test]
    fn configuration_comes_from_configure() {
        let test: Arc<dyn DynTest> = Arc::new(CounterTest { expected: 0 });
        let config = test.configuration();
        assert!(config.is_partitioning_enabled);
        assert_eq!(config.setup_timeout_secs, 5);
        assert_eq!(config.run_timeout_secs, 6);
    }

    #[tokio::test]
    async fn dyn_setup_then_run_round_trips_the_network() {
        let test: Arc<dyn DynTest> = Arc::new(CounterTest { expected: 2 });
        let network = test.setup(artifact_context(2)).await.unwrap();
        test.run(&network, TestContext::default()).await.unwrap();
    }

    #[tokio::test]
    async fn dyn_run_reports_test_failure() {
        let test: Arc<dyn DynTest> = Arc::new(CounterTest { expected: 3 });
        let network = test.setup(artifact_context(1)).await.unwrap();
        let err = test.run(&network, TestContext::default()).await.unwrap_err();
        assert!(matches!(err, TestError::Assertion { .. }));
    }

    #[tokio::test]
    async fn dyn_run_rejects_foreign_network_handle() {
        let test: Arc<dyn DynTest> = Arc::new(CounterTest { expected: 0 });
        let foreign: NetworkHandle = Box::new("not a counter network");
        let err = test.run(&foreign, TestContext::default()).await.unwrap_err();
        assert!(matches!(err, TestError::NetworkTypeMismatch { .. }));
    }

    #[test]
    fn network_context_looks_up_artifacts() {
        let ctx = artifact_context(1);
        assert_eq!(
            ctx.files_artifact_url(&FilesArtifactId::new("a0")),
            Some("https://x/0")
        );
        assert_eq!(ctx.files_artifact_url(&FilesArtifactId::new("zz")), None);
    }
}
