use keystone_core::{AgentResult, ProjectInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Verdict over all agents of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Success,
    PartialSuccess,
    Failure,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallStatus::Success => write!(f, "success"),
            OverallStatus::PartialSuccess => write!(f, "partial_success"),
            OverallStatus::Failure => write!(f, "failure"),
        }
    }
}

/// The single response document produced for a request.
///
/// Maps are ordered so that identical inputs serialize byte-for-byte identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedOutput {
    pub overall_status: OverallStatus,
    /// Normalized echo of the submitted brief.
    pub user_input_received: ProjectInput,
    /// Successful agent data keyed by each agent's output key.
    pub consolidated_project_data: BTreeMap<String, Value>,
    /// Every scheduled agent's result, success or failure, keyed by agent name.
    pub agent_outputs_raw: BTreeMap<String, AgentResult>,
    pub summary_message: String,
}

impl ConsolidatedOutput {
    /// Agents whose result is a success.
    pub fn succeeded_count(&self) -> usize {
        self.agent_outputs_raw
            .values()
            .filter(|r| r.is_success())
            .count()
    }

    /// Agents whose result is a failure.
    pub fn failed_count(&self) -> usize {
        self.agent_outputs_raw.len() - self.succeeded_count()
    }
}
