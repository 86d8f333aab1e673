//! Params-JSON parsing and logging hooks for the example suite.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use testbed_core::error::{ConfigError, TestbedError};
use testbed_core::testsuite::TestSuite;
use testbed_executor::TestSuiteConfigurator;
use testbed_executor::logging::init_tracing;
use tracing::info;

use crate::suite::ExampleTestsuite;

const MAX_NODE_COUNT: u32 = 32;

/// Parameters the orchestrator passes through `--params-json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ExampleTestsuiteArgs {
    /// Payload every echo test sends
    pub echo_message: String,
    /// Node count for `multiNodeEchoTest`
    pub node_count: u32,
    /// Registers tests that only make sense against a development orchestrator
    pub is_dev_mode: bool,
}

impl Default for ExampleTestsuiteArgs {
    fn default() -> Self {
        Self {
            echo_message: "hello testbed".to_owned(),
            node_count: 3,
            is_dev_mode: false,
        }
    }
}

impl ExampleTestsuiteArgs {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.echo_message.is_empty() || self.echo_message.contains('\n') {
            return Err(ConfigError::InvalidValue {
                field: "echoMessage".to_owned(),
                reason: "must be a non-empty single line".to_owned(),
            });
        }
        if self.node_count == 0 || self.node_count > MAX_NODE_COUNT {
            return Err(ConfigError::InvalidValue {
                field: "nodeCount".to_owned(),
                reason: format!("must be 1-{MAX_NODE_COUNT}"),
            });
        }
        Ok(())
    }
}

/// [`TestSuiteConfigurator`] for [`ExampleTestsuite`].
#[derive(Debug, Clone)]
pub struct ExampleTestsuiteConfigurator {
    log_format: String,
}

impl ExampleTestsuiteConfigurator {
    pub fn new(log_format: impl Into<String>) -> Self {
        Self {
            log_format: log_format.into(),
        }
    }
}

impl TestSuiteConfigurator for ExampleTestsuiteConfigurator {
    fn init_logging(&self, log_level: &str) -> Result<(), TestbedError> {
        init_tracing(log_level, &self.log_format)
    }

    fn parse_params_and_create_suite(
        &self,
        params_json: &str,
    ) -> Result<Arc<dyn TestSuite>, TestbedError> {
        let args: ExampleTestsuiteArgs =
            serde_json::from_str(params_json).map_err(|e| ConfigError::ParseFailed {
                reason: format!("testsuite params JSON: {e}"),
            })?;
        args.validate()?;

        info!(
            node_count = args.node_count,
            is_dev_mode = args.is_dev_mode,
            "example testsuite configured"
        );
        Ok(Arc::new(ExampleTestsuite::new(
            args.echo_message,
            args.node_count as usize,
            args.is_dev_mode,
        )))
    }
}
