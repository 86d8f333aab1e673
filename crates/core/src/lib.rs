#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`testsuite`]: the `Test` / `TestSuite` traits a suite author implements
//! - [`types`]: test configuration and the orchestrator wire types
//! - [`config`]: agent configuration (`testbed.toml`, environment)
//! - [`error`]: error types
//! - [`metrics`]: metric names

pub mod config;
pub mod error;
pub mod metrics;
pub mod testsuite;
pub mod types;

// errors
pub use error::{ConfigError, TestError, TestbedError};

// config
pub use config::AgentConfig;

// test-suite traits
pub use testsuite::{
    BoxFuture, DynTest, NetworkContext, NetworkHandle, Test, TestContext, TestSuite,
};

// domain / wire types
pub use types::{
    FilesArtifactId, SuiteAction, SuiteRegistrationResponse, TestConfiguration,
    TestConfigurationBuilder, TestExecutionInfo, TestMetadata, TestSuiteMetadata,
};
