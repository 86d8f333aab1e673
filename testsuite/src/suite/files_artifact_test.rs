use testbed_core::error::TestError;
use testbed_core::testsuite::{NetworkContext, Test, TestContext};
use testbed_core::types::{FilesArtifactId, TestConfigurationBuilder};

use crate::network::EchoNetwork;

pub const TEST_ARTIFACT_ID: &str = "echo-fixtures";
pub const TEST_ARTIFACT_URL: &str =
    "https://testbed-public-artifacts.s3.amazonaws.com/echo-fixtures.tgz";

/// Declares a files artifact and checks setup can see its URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesArtifactTest;

impl Test for FilesArtifactTest {
    type Network = EchoNetwork;

    fn configure(&self, builder: &mut TestConfigurationBuilder) {
        builder
            .with_files_artifact_url(TEST_ARTIFACT_ID, TEST_ARTIFACT_URL)
            .with_setup_timeout_secs(60)
            .with_run_timeout_secs(30);
    }

    async fn setup(&self, ctx: NetworkContext) -> Result<EchoNetwork, TestError> {
        let id = FilesArtifactId::new(TEST_ARTIFACT_ID);
        match ctx.files_artifact_url(&id) {
            Some(url) if url == TEST_ARTIFACT_URL => EchoNetwork::start(1).await,
            Some(url) => Err(TestError::assertion(TEST_ARTIFACT_URL, url)),
            None => Err(TestError::failed(format!(
                "files artifact '{id}' missing from setup context"
            ))),
        }
    }

    async fn run(&self, network: &EchoNetwork, _ctx: TestContext) -> Result<(), TestError> {
        let reply = network.echo(0, TEST_ARTIFACT_ID).await?;
        if reply != TEST_ARTIFACT_ID {
            return Err(TestError::assertion(TEST_ARTIFACT_ID, reply));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[tokio::test]
    async fn setup_fails_without_the_artifact() {
        let err = Test::setup(&FilesArtifactTest, NetworkContext::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains(TEST_ARTIFACT_ID));
    }

    #[tokio::test]
    async fn setup_succeeds_with_the_declared_artifact() {
        let mut urls = HashMap::new();
        urls.insert(
            FilesArtifactId::new(TEST_ARTIFACT_ID),
            TEST_ARTIFACT_URL.to_owned(),
        );
        let network = Test::setup(&FilesArtifactTest, NetworkContext::new(urls))
            .await
            .unwrap();
        Test::run(&FilesArtifactTest, &network, TestContext::default())
            .await
            .unwrap();
    }
}
