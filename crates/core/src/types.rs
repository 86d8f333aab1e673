//! Domain and wire types exchanged with the orchestrator.
//!
//! Wire types serialize with camelCase field names.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

const DEFAULT_SETUP_TIMEOUT_SECS: u32 = 180;
const DEFAULT_RUN_TIMEOUT_SECS: u32 = 180;

// ─── FilesArtifactId ─────────────────────────────────────────────────

/// Identifier of a files artifact (an archive the orchestrator can mount
/// into services) declared by a test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilesArtifactId(String);

impl FilesArtifactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilesArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FilesArtifactId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ─── TestConfiguration ───────────────────────────────────────────────

/// Configuration a test declares about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfiguration {
    /// Whether the orchestrator must allow network partitioning for this test
    pub is_partitioning_enabled: bool,
    /// Artifact ID -> URL the orchestrator downloads the artifact from
    pub files_artifact_urls: HashMap<FilesArtifactId, String>,
    /// Seconds the orchestrator grants the setup routine
    pub setup_timeout_secs: u32,
    /// Seconds the orchestrator grants the run routine
    pub run_timeout_secs: u32,
}

impl Default for TestConfiguration {
    fn default() -> Self {
        Self {
            is_partitioning_enabled: false,
            files_artifact_urls: HashMap::new(),
            setup_timeout_secs: DEFAULT_SETUP_TIMEOUT_SECS,
            run_timeout_secs: DEFAULT_RUN_TIMEOUT_SECS,
        }
    }
}

/// Builder handed to `Test::configure`.
#[derive(Debug, Default)]
pub struct TestConfigurationBuilder {
    config: TestConfiguration,
}

impl TestConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_partitioning_enabled(&mut self, enabled: bool) -> &mut Self {
        self.config.is_partitioning_enabled = enabled;
        self
    }

    /// Declares a files artifact. Re-declaring an ID replaces its URL.
    pub fn with_files_artifact_url(
        &mut self,
        id: impl Into<FilesArtifactId>,
        url: impl Into<String>,
    ) -> &mut Self {
        self.config.files_artifact_urls.insert(id.into(), url.into());
        self
    }

    pub fn with_setup_timeout_secs(&mut self, secs: u32) -> &mut Self {
        self.config.setup_timeout_secs = secs;
        self
    }

    pub fn with_run_timeout_secs(&mut self, secs: u32) -> &mut Self {
        self.config.run_timeout_secs = secs;
        self
    }

    pub fn build(self) -> TestConfiguration {
        self.config
    }
}

// ─── Suite metadata (wire) ───────────────────────────────────────────

/// Structural description of one test, sent during metadata serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMetadata {
    pub is_partitioning_enabled: bool,
    /// Deduplicated artifact URLs; presence is what matters, not order or count
    pub used_artifact_urls: BTreeSet<String>,
    pub test_setup_timeout_in_seconds: u32,
    pub test_execution_timeout_in_seconds: u32,
}

impl TestMetadata {
    pub fn from_configuration(config: &TestConfiguration) -> Self {
        Self {
            is_partitioning_enabled: config.is_partitioning_enabled,
            used_artifact_urls: config.files_artifact_urls.values().cloned().collect(),
            test_setup_timeout_in_seconds: config.setup_timeout_secs,
            test_execution_timeout_in_seconds: config.run_timeout_secs,
        }
    }
}

/// Description of a whole suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuiteMetadata {
    /// Test name -> metadata
    pub test_metadata: BTreeMap<String, TestMetadata>,
    pub network_width_bits: u32,
}

// ─── Registration / execution (wire) ─────────────────────────────────

/// What the orchestrator wants this agent process to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteAction {
    SerializeSuiteMetadata,
    ExecuteTest,
}

impl SuiteAction {
    pub const SERIALIZE_SUITE_METADATA: &'static str = "SERIALIZE_SUITE_METADATA";
    pub const EXECUTE_TEST: &'static str = "EXECUTE_TEST";

    /// Parses the wire name. Unknown names yield `None`.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            Self::SERIALIZE_SUITE_METADATA => Some(Self::SerializeSuiteMetadata),
            Self::EXECUTE_TEST => Some(Self::ExecuteTest),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::SerializeSuiteMetadata => Self::SERIALIZE_SUITE_METADATA,
            Self::ExecuteTest => Self::EXECUTE_TEST,
        }
    }
}

impl fmt::Display for SuiteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Response to `RegisterSuite`.
///
/// The action stays a raw string so that a value this agent does not know
/// reaches the dispatcher as a protocol mismatch instead of failing to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteRegistrationResponse {
    pub suite_action: String,
}

impl SuiteRegistrationResponse {
    pub fn new(action: SuiteAction) -> Self {
        Self {
            suite_action: action.as_wire().to_owned(),
        }
    }
}

/// Response to `GetTestExecutionInfo`: the single test this process runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestExecutionInfo {
    pub test_name: String,
}
