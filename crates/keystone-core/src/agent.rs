use crate::error::{AgentError, AgentErrorKind};
use crate::input::ProjectInput;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Trait that every analysis agent implements.
///
/// An agent declares who it is, which key its output is merged under and
/// which other agents it needs, and exposes one operation: `execute`. Agents
/// own their model client; the orchestrator never talks to the model service.
#[async_trait]
pub trait AgentCapability: Send + Sync {
    /// Registry name, e.g. `generative_architectural_design_agent`.
    fn name(&self) -> &str;

    /// Human-readable name used in logs and prompts.
    fn display_name(&self) -> &str {
        self.name()
    }

    /// Stable key under which successful output is consolidated.
    fn output_key(&self) -> &str;

    /// Registry names of the agents whose output this agent consumes.
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    /// Run the agent against its context.
    async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError>;
}

/// Output of a dependency as seen by a downstream agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UpstreamOutput {
    /// The dependency succeeded with this data.
    Available { data: Value },
    /// The dependency failed; its data is withheld.
    Unavailable { error_kind: AgentErrorKind },
}

/// What an agent sees when it runs: the brief plus the outcome of each of
/// its declared dependencies.
///
/// Built fresh for every invocation and owned by that invocation alone.
#[derive(Debug, Clone)]
pub struct AgentContext {
    input: Arc<ProjectInput>,
    upstream: BTreeMap<String, UpstreamOutput>,
}

impl AgentContext {
    pub fn new(input: Arc<ProjectInput>) -> Self {
        Self {
            input,
            upstream: BTreeMap::new(),
        }
    }

    pub fn with_upstream(mut self, agent: impl Into<String>, output: UpstreamOutput) -> Self {
        self.upstream.insert(agent.into(), output);
        self
    }

    pub fn input(&self) -> &ProjectInput {
        &self.input
    }

    pub fn upstream(&self) -> &BTreeMap<String, UpstreamOutput> {
        &self.upstream
    }

    /// Data produced by `agent`, if it ran and succeeded.
    pub fn dependency(&self, agent: &str) -> Option<&Value> {
        match self.upstream.get(agent) {
            Some(UpstreamOutput::Available { data }) => Some(data),
            _ => None,
        }
    }

    /// `true` if `agent` is a dependency that failed.
    pub fn is_unavailable(&self, agent: &str) -> bool {
        matches!(self.upstream.get(agent), Some(UpstreamOutput::Unavailable { .. }))
    }

    /// Dependency output rendered for a prompt.
    ///
    /// A failed dependency renders as
    /// `{"upstream_unavailable": true, "error_kind": "<kind>"}` and an
    /// undeclared one as `null`.
    pub fn upstream_json(&self, agent: &str) -> Value {
        match self.upstream.get(agent) {
            Some(UpstreamOutput::Available { data }) => data.clone(),
            Some(UpstreamOutput::Unavailable { error_kind }) => serde_json::json!({
                "upstream_unavailable": true,
                "error_kind": error_kind,
            }),
            None => Value::Null,
        }
    }

    /// A string field of a dependency's output, or `fallback` when the
    /// dependency is unavailable or the field is absent.
    pub fn upstream_str<'a>(&'a self, agent: &str, field: &str, fallback: &'a str) -> &'a str {
        self.dependency(agent)
            .and_then(|d| d.get(field))
            .and_then(Value::as_str)
            .unwrap_or(fallback)
    }
}

/// Recorded outcome of one agent within one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentResult {
    Success {
        agent_name: String,
        data: Value,
    },
    Failure {
        agent_name: String,
        error_kind: AgentErrorKind,
        message: String,
    },
}

impl AgentResult {
    /// Convert an `execute` outcome into a recorded result.
    pub fn from_outcome(agent_name: impl Into<String>, outcome: Result<Value, AgentError>) -> Self {
        let agent_name = agent_name.into();
        match outcome {
            Ok(data) => AgentResult::Success { agent_name, data },
            Err(e) => AgentResult::failure(agent_name, e),
        }
    }

    pub fn failure(agent_name: impl Into<String>, error: AgentError) -> Self {
        AgentResult::Failure {
            agent_name: agent_name.into(),
            error_kind: error.kind,
            message: error.message,
        }
    }

    pub fn agent_name(&self) -> &str {
        match self {
            AgentResult::Success { agent_name, .. } | AgentResult::Failure { agent_name, .. } => {
                agent_name
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AgentResult::Success { .. })
    }

    /// What a downstream agent is allowed to see of this result.
    pub fn as_upstream(&self) -> UpstreamOutput {
        match self {
            AgentResult::Success { data, .. } => UpstreamOutput::Available { data: data.clone() },
            AgentResult::Failure { error_kind, .. } => UpstreamOutput::Unavailable {
                error_kind: *error_kind,
            },
        }
    }
}
