use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A convenience `Result` alias using [`KeystoneError`].
pub type KeystoneResult<T> = Result<T, KeystoneError>;

/// Top-level error type for Keystone.
///
/// Only request validation and configuration problems surface through this
/// type. Failures of individual agents are converted to data
/// ([`crate::AgentResult::Failure`]) and never abort a request.
#[derive(Error, Debug)]
pub enum KeystoneError {
    /// The submitted project brief is malformed or incomplete.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The agent registry or dependency graph is misconfigured.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Invalid or missing configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// An outbound HTTP problem outside any single agent.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One problem found with one field of a [`crate::ProjectInput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

/// The project brief failed structural validation.
///
/// Carries every violation found, not only the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid project input: {}", summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Returns `true` if any violation concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration-time failures of the dependency graph.
///
/// These are fatal at startup and never occur while serving a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The declared dependencies contain a cycle. `path` lists the agents on
    /// the cycle, with the first agent repeated at the end.
    #[error("dependency cycle detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    /// An agent depends on a name that is not registered.
    #[error("agent '{agent}' depends on unknown agent '{dependency}'")]
    UnknownDependency { agent: String, dependency: String },

    /// Two agents were registered under the same name.
    #[error("agent '{0}' is registered more than once")]
    DuplicateAgent(String),

    /// Two agents claim the same key in the consolidated output.
    #[error("output key '{key}' is claimed by both '{first}' and '{second}'")]
    DuplicateOutputKey {
        key: String,
        first: String,
        second: String,
    },
}

/// Classification of a failed agent invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentErrorKind {
    /// The agent did not finish within its time budget, or the request
    /// deadline expired before it completed.
    Timeout,
    /// Network failure or rate limiting; eligible for retry.
    TransientServiceError,
    /// The model service rejected the call; retrying will not help.
    PermanentServiceError,
    /// The agent's structured response failed to parse or validate.
    MalformedAgentOutput,
}

impl AgentErrorKind {
    /// Whether a retry may succeed where this attempt failed.
    pub fn is_transient(self) -> bool {
        matches!(self, AgentErrorKind::TransientServiceError)
    }

    /// The snake_case label used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            AgentErrorKind::Timeout => "timeout",
            AgentErrorKind::TransientServiceError => "transient_service_error",
            AgentErrorKind::PermanentServiceError => "permanent_service_error",
            AgentErrorKind::MalformedAgentOutput => "malformed_agent_output",
        }
    }
}

impl std::fmt::Display for AgentErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure scoped to a single agent invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct AgentError {
    pub kind: AgentErrorKind,
    pub message: String,
}

impl AgentError {
    pub fn new(kind: AgentErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::Timeout, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::TransientServiceError, message)
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::PermanentServiceError, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::MalformedAgentOutput, message)
    }

    /// Shorthand for `self.kind.is_transient()`.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}
