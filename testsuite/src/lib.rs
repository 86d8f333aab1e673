//! Example test suite for the testbed execution agent.
//!
//! This library exposes the suite, its network and its configurator for
//! integration testing. In production `testbed-testsuite` is run as a binary
//! (main.rs) launched by the orchestrator.

pub mod cli;
pub mod configurator;
pub mod network;
pub mod suite;

pub use configurator::{ExampleTestsuiteArgs, ExampleTestsuiteConfigurator};
pub use network::EchoNetwork;
pub use suite::ExampleTestsuite;
