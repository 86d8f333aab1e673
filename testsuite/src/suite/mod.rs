//! The example suite and its tests.

mod files_artifact_test;

use std::collections::BTreeMap;
use std::sync::Arc;

use testbed_core::testsuite::{DynTest, TestSuite};

pub use echo_test::EchoTest;
pub use files_artifact_test::{FilesArtifactTest, TEST_ARTIFACT_ID, TEST_ARTIFACT_URL};
pub use multi_node_echo_test::MultiNodeEchoTest;

pub const ECHO_TEST: &str = "echoTest";
pub const MULTI_NODE_ECHO_TEST: &str = "multiNodeEchoTest";
pub const FILES_ARTIFACT_TEST: &str = "filesArtifactTest";

const NETWORK_WIDTH_BITS: u32 = 8;

/// Suite of echo tests. `filesArtifactTest` is only registered in dev mode.
#[derive(Debug, Clone)]
pub struct ExampleTestsuite {
    echo_message: String,
    node_count: usize,
    is_dev_mode: bool,
}

impl ExampleTestsuite {
    pub fn new(echo_message: impl Into<String>, node_count: usize, is_dev_mode: bool) -> Self {
        Self {
            echo_message: echo_message.into(),
            node_count,
            is_dev_mode,
        }
    }
}

impl TestSuite for ExampleTestsuite {
    fn tests(&self) -> BTreeMap<String, Arc<dyn DynTest>> {
        let mut tests: BTreeMap<String, Arc<dyn DynTest>> = BTreeMap::new();
        tests.insert(
            ECHO_TEST.to_owned(),
            Arc::new(EchoTest::new(self.echo_message.clone())),
        );
        tests.insert(
            MULTI_NODE_ECHO_TEST.to_owned(),
            Arc::new(MultiNodeEchoTest::new(
                self.echo_message.clone(),
                self.node_count,
            )),
        );
        if self.is_dev_mode {
            tests.insert(FILES_ARTIFACT_TEST.to_owned(), Arc::new(FilesArtifactTest));
        }
        tests
    }

    fn network_width_bits(&self) -> u32 {
        NETWORK_WIDTH_BITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testbed_core::testsuite::TestContext;

    #[test]
    fn release_mode_registers_two_tests() {
        let suite = ExampleTestsuite::new("hi", 3, false);
        let names: Vec<String> = suite.tests().into_keys().collect();
        assert_eq!(names, vec![ECHO_TEST, MULTI_NODE_ECHO_TEST]);
        assert_eq!(suite.network_width_bits(), 8);
    }

    #[test]
    fn dev_mode_adds_files_artifact_test() {
        let suite = ExampleTestsuite::new("hi", 3, true);
        let tests = suite.tests();
        assert_eq!(tests.len(), 3);
        assert!(tests.contains_key(FILES_ARTIFACT_TEST));
    }

    #[test]
    fn only_multi_node_test_enables_partitioning() {
        let tests = ExampleTestsuite::new("hi", 2, true).tests();
        assert!(!tests[ECHO_TEST].configuration().is_partitioning_enabled);
        assert!(tests[MULTI_NODE_ECHO_TEST].configuration().is_partitioning_enabled);
        assert!(!tests[FILES_ARTIFACT_TEST].configuration().is_partitioning_enabled);
    }

    #[tokio::test]
    async fn every_release_test_passes_through_the_dyn_interface() {
        let suite = ExampleTestsuite::new("round trip", 2, false);
        for (name, test) in suite.tests() {
            let network = test
                .setup(Default::default())
                .await
                .unwrap_or_else(|e| panic!("{name} setup: {e}"));
            test.run(&network, TestContext::default())
                .await
                .unwrap_or_else(|e| panic!("{name} run: {e}"));
        }
    }
}
