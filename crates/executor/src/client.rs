//! Orchestrator API abstraction.
//!
//! The [`OrchestratorClient`] trait covers every remote procedure the agent
//! calls. Production code uses [`HttpOrchestratorClient`]; tests use
//! `MockOrchestratorClient`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  TestSuiteExecutor   │
//! └──────────┬───────────┘
//!            │
//!            ▼
//!  ┌────────────────────┐
//!  │ OrchestratorClient │ (trait)
//!  └────────────────────┘
//!        │         │
//!        ▼         ▼
//!    ┌──────┐  ┌──────┐
//!    │ Http │  │ Mock │
//!    └──┬───┘  └──────┘
//!       │
//!       ▼
//!   Orchestrator API
//! ```
//!
//! # Wire format
//!
//! Each call is `POST http://{api_socket}/{Service}/{Method}` with a JSON body
//! (`{}` when the request carries nothing). A 2xx response carries the JSON
//! response message; any other status is an error whose body is the message.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use testbed_core::types::{SuiteRegistrationResponse, TestExecutionInfo, TestSuiteMetadata};
use tracing::trace;

use crate::error::{ExecutorError, RpcError};

/// Remote method names. Used as request paths, step names and metric labels.
pub mod method {
    pub const REGISTER_SUITE: &str = "RegisterSuite";
    pub const SERIALIZE_SUITE_METADATA: &str = "SerializeSuiteMetadata";
    pub const GET_TEST_EXECUTION_INFO: &str = "GetTestExecutionInfo";
    pub const REGISTER_TEST_SETUP: &str = "RegisterTestSetup";
    pub const REGISTER_TEST_SETUP_COMPLETION: &str = "RegisterTestSetupCompletion";
    pub const REGISTER_TEST_EXECUTION: &str = "RegisterTestExecution";
}

const SUITE_REGISTRATION_SERVICE: &str = "SuiteRegistrationService";
const SUITE_METADATA_SERIALIZATION_SERVICE: &str = "SuiteMetadataSerializationService";
const TEST_EXECUTION_SERVICE: &str = "TestExecutionService";

/// Remote procedures the orchestrator exposes to an execution agent.
///
/// Implementations return [`RpcError`] for any failure; callers decide
/// whether it is retried (registration) or fatal (everything else).
pub trait OrchestratorClient: Send + Sync + 'static {
    /// Announces this suite process and asks what to do.
    fn register_suite(
        &self,
    ) -> impl Future<Output = Result<SuiteRegistrationResponse, RpcError>> + Send;

    /// Sends the structural description of every test.
    fn serialize_suite_metadata(
        &self,
        metadata: &TestSuiteMetadata,
    ) -> impl Future<Output = Result<(), RpcError>> + Send;

    /// Asks which single test this process runs.
    fn get_test_execution_info(
        &self,
    ) -> impl Future<Output = Result<TestExecutionInfo, RpcError>> + Send;

    /// Setup is about to start; the orchestrator starts its setup timer.
    fn register_test_setup(&self) -> impl Future<Output = Result<(), RpcError>> + Send;

    /// Setup finished.
    fn register_test_setup_completion(&self)
    -> impl Future<Output = Result<(), RpcError>> + Send;

    /// The test body is about to start; the orchestrator starts its run timer.
    fn register_test_execution(&self) -> impl Future<Output = Result<(), RpcError>> + Send;
}

#[derive(Serialize)]
struct Empty {}

/// JSON-over-HTTP orchestrator client built on `reqwest`.
///
/// Construction does not touch the network; the first request opens the
/// connection, so an orchestrator that is still starting is absorbed by the
/// registration retries.
///
/// ```ignore
/// let client = HttpOrchestratorClient::connect("172.17.0.2:7443", Duration::from_secs(30))?;
/// let action = client.register_suite().await?;
/// ```
pub struct HttpOrchestratorClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpOrchestratorClient {
    /// Builds a client for the orchestrator at `api_socket` (`host:port`).
    ///
    /// # Errors
    ///
    /// Returns `ExecutorError::Connection` if the socket string is malformed
    /// or the HTTP client cannot be built.
    pub fn connect(api_socket: &str, request_timeout: Duration) -> Result<Self, ExecutorError> {
        validate_api_socket(api_socket)?;

        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ExecutorError::Connection(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: format!("http://{api_socket}"),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        service: &str,
        method: &str,
        body: &B,
    ) -> Result<reqwest::Response, RpcError> {
        let url = format!("{}/{service}/{method}", self.base_url);
        trace!(url = url.as_str(), "orchestrator call");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RpcError::Status {
                code: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn call<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        service: &str,
        method: &str,
        body: &B,
    ) -> Result<R, RpcError> {
        self.send(service, method, body)
            .await?
            .json::<R>()
            .await
            .map_err(|e| RpcError::Decode(e.to_string()))
    }

    /// Calls a method whose response carries nothing; the body is discarded.
    async fn acknowledge(&self, service: &str, method: &str) -> Result<(), RpcError> {
        self.send(service, method, &Empty {}).await.map(drop)
    }
}

impl OrchestratorClient for HttpOrchestratorClient {
    async fn register_suite(&self) -> Result<SuiteRegistrationResponse, RpcError> {
        self.call(SUITE_REGISTRATION_SERVICE, method::REGISTER_SUITE, &Empty {})
            .await
    }

    async fn serialize_suite_metadata(&self, metadata: &TestSuiteMetadata) -> Result<(), RpcError> {
        self.send(
            SUITE_METADATA_SERIALIZATION_SERVICE,
            method::SERIALIZE_SUITE_METADATA,
            metadata,
        )
        .await
        .map(drop)
    }

    async fn get_test_execution_info(&self) -> Result<TestExecutionInfo, RpcError> {
        self.call(
            TEST_EXECUTION_SERVICE,
            method::GET_TEST_EXECUTION_INFO,
            &Empty {},
        )
        .await
    }

    async fn register_test_setup(&self) -> Result<(), RpcError> {
        self.acknowledge(TEST_EXECUTION_SERVICE, method::REGISTER_TEST_SETUP)
            .await
    }

    async fn register_test_setup_completion(&self) -> Result<(), RpcError> {
        self.acknowledge(TEST_EXECUTION_SERVICE, method::REGISTER_TEST_SETUP_COMPLETION)
            .await
    }

    async fn register_test_execution(&self) -> Result<(), RpcError> {
        self.acknowledge(TEST_EXECUTION_SERVICE, method::REGISTER_TEST_EXECUTION)
            .await
    }
}

/// `host:port` with a non-empty host and a numeric port. No scheme.
fn validate_api_socket(api_socket: &str) -> Result<(), ExecutorError> {
    if api_socket.is_empty() {
        return Err(ExecutorError::Connection(
            "orchestrator api socket is empty".to_owned(),
        ));
    }
    if api_socket.contains("://") || api_socket.contains(char::is_whitespace) {
        return Err(ExecutorError::Connection(format!(
            "invalid orchestrator api socket '{api_socket}': expected host:port"
        )));
    }
    let valid = api_socket
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
    if !valid {
        return Err(ExecutorError::Connection(format!(
            "invalid orchestrator api socket '{api_socket}': expected host:port"
        )));
    }
    Ok(())
}

// ─── Mock ────────────────────────────────────────────────────────────

/// Scriptable orchestrator for unit tests. Records every call in order.
#[cfg(test)]
pub struct MockOrchestratorClient {
    /// Registration attempts that fail before one succeeds
    pub registration_failures: u32,
    /// Raw action returned by a successful registration
    pub suite_action: String,
    /// Test name returned by `get_test_execution_info`
    pub test_name: String,
    /// Method that fails every time it is called
    pub failing_method: Option<&'static str>,
    calls: std::sync::Mutex<Vec<&'static str>>,
    registration_instants: std::sync::Mutex<Vec<tokio::time::Instant>>,
    metadata: std::sync::Mutex<Option<TestSuiteMetadata>>,
}

#[cfg(test)]
impl MockOrchestratorClient {
    pub fn new(action: testbed_core::types::SuiteAction) -> Self {
        Self {
            registration_failures: 0,
            suite_action: action.as_wire().to_owned(),
            test_name: String::new(),
            failing_method: None,
            calls: std::sync::Mutex::new(Vec::new()),
            registration_instants: std::sync::Mutex::new(Vec::new()),
            metadata: std::sync::Mutex::new(None),
        }
    }

    pub fn with_raw_action(mut self, raw: &str) -> Self {
        self.suite_action = raw.to_owned();
        self
    }

    pub fn with_registration_failures(mut self, failures: u32) -> Self {
        self.registration_failures = failures;
        self
    }

    pub fn with_test_name(mut self, name: &str) -> Self {
        self.test_name = name.to_owned();
        self
    }

    pub fn with_failing_method(mut self, method: &'static str) -> Self {
        self.failing_method = Some(method);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn registration_instants(&self) -> Vec<tokio::time::Instant> {
        self.registration_instants.lock().unwrap().clone()
    }

    pub fn serialized_metadata(&self) -> Option<TestSuiteMetadata> {
        self.metadata.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str) -> Result<(), RpcError> {
        self.calls.lock().unwrap().push(method);
        if self.failing_method == Some(method) {
            return Err(RpcError::Status {
                code: 500,
                message: format!("mock failure in {method}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
impl OrchestratorClient for MockOrchestratorClient {
    async fn register_suite(&self) -> Result<SuiteRegistrationResponse, RpcError> {
        self.record(method::REGISTER_SUITE)?;
        let attempt = {
            let mut instants = self.registration_instants.lock().unwrap();
            instants.push(tokio::time::Instant::now());
            instants.len()
        };
        if attempt <= self.registration_failures as usize {
            return Err(RpcError::Transport("connection refused".to_owned()));
        }
        Ok(SuiteRegistrationResponse {
            suite_action: self.suite_action.clone(),
        })
    }

    async fn serialize_suite_metadata(&self, metadata: &TestSuiteMetadata) -> Result<(), RpcError> {
        self.record(method::SERIALIZE_SUITE_METADATA)?;
        *self.metadata.lock().unwrap() = Some(metadata.clone());
        Ok(())
    }

    async fn get_test_execution_info(&self) -> Result<TestExecutionInfo, RpcError> {
        self.record(method::GET_TEST_EXECUTION_INFO)?;
        Ok(TestExecutionInfo {
            test_name: self.test_name.clone(),
        })
    }

    async fn register_test_setup(&self) -> Result<(), RpcError> {
        self.record(method::REGISTER_TEST_SETUP)
    }

    async fn register_test_setup_completion(&self) -> Result<(), RpcError> {
        self.record(method::REGISTER_TEST_SETUP_COMPLETION)
    }

    async fn register_test_execution(&self) -> Result<(), RpcError> {
        self.record(method::REGISTER_TEST_EXECUTION)
    }
}
