#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: `ExecutorError`, `RpcError`, `TestFault`
//! - [`client`]: orchestrator API abstraction (`OrchestratorClient`, `HttpOrchestratorClient`)
//! - [`registration`]: bounded-retry suite registration
//! - [`dispatch`]: action routing
//! - [`metadata`]: metadata serialization flow
//! - [`execution`]: single-test execution flow
//! - [`isolation`]: panic-isolating test runner
//! - [`executor`]: `TestSuiteExecutor`, `TestSuiteConfigurator`
//! - [`logging`]: tracing subscriber setup

pub mod client;
pub mod dispatch;
pub mod error;
pub mod execution;
pub mod executor;
pub mod isolation;
pub mod logging;
pub mod metadata;
pub mod registration;
mod rpc;

// --- Public API Re-exports ---

// Entry point
pub use executor::{TestSuiteConfigurator, TestSuiteExecutor, run_with_client};

// Errors
pub use error::{ExecutorError, RpcError, TestFault};

// Orchestrator API
pub use client::{HttpOrchestratorClient, OrchestratorClient};

// Protocol constants
pub use registration::{MAX_REGISTRATION_ATTEMPTS, REGISTRATION_RETRY_DELAY};
