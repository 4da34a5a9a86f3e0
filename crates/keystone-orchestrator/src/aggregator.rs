use crate::registry::AgentRegistry;
use crate::types::{ConsolidatedOutput, OverallStatus};
use keystone_core::{AgentError, AgentResult, ProjectInput};
use std::collections::BTreeMap;
use tracing::warn;

/// Overall verdict for `succeeded` and `failed` agent counts.
///
/// A request with no agents at all counts as a failure.
pub fn resolve_status(succeeded: usize, failed: usize) -> OverallStatus {
    match (succeeded, failed) {
        (0, _) => OverallStatus::Failure,
        (_, 0) => OverallStatus::Success,
        _ => OverallStatus::PartialSuccess,
    }
}

/// Merges per-agent results into a [`ConsolidatedOutput`].
///
/// Holds the registry's `(agent name, output key)` pairs so results can be
/// placed without consulting the agents themselves.
#[derive(Debug, Clone)]
pub struct Aggregator {
    agents: Vec<(String, String)>,
}

impl Aggregator {
    /// Capture each agent's name and output key, in registration order.
    pub fn new(registry: &AgentRegistry) -> Self {
        Self {
            agents: registry
                .iter()
                .map(|a| (a.name().to_string(), a.output_key().to_string()))
                .collect(),
        }
    }

    /// Build the response document.
    ///
    /// Every registered agent appears in `agent_outputs_raw`; an agent with no
    /// result is recorded as a failure. Only successes contribute to
    /// `consolidated_project_data`. The output depends on nothing but
    /// `input` and `results`.
    pub fn aggregate(&self, input: ProjectInput, results: Vec<AgentResult>) -> ConsolidatedOutput {
        let mut by_name: BTreeMap<String, AgentResult> = BTreeMap::new();
        for result in results {
            let name = result.agent_name().to_string();
            if !self.agents.iter().any(|(n, _)| *n == name) {
                warn!(agent = %name, "Dropping result for unregistered agent");
                continue;
            }
            if by_name.contains_key(&name) {
                warn!(agent = %name, "Dropping duplicate agent result");
                continue;
            }
            by_name.insert(name, result);
        }

        let mut consolidated = BTreeMap::new();
        let mut failed: Vec<&str> = Vec::new();
        for (name, output_key) in &self.agents {
            let result = by_name.entry(name.clone()).or_insert_with(|| {
                AgentResult::failure(name, AgentError::permanent("agent produced no result"))
            });
            match result {
                AgentResult::Success { data, .. } => {
                    consolidated.insert(output_key.clone(), data.clone());
                }
                AgentResult::Failure { .. } => failed.push(name),
            }
        }

        let total = self.agents.len();
        let succeeded = total - failed.len();
        let overall_status = resolve_status(succeeded, failed.len());
        let summary_message =
            summarize(overall_status, &input.client_name, total, succeeded, &failed);

        ConsolidatedOutput {
            overall_status,
            user_input_received: input,
            consolidated_project_data: consolidated,
            agent_outputs_raw: by_name,
            summary_message,
        }
    }
}

fn summarize(
    status: OverallStatus,
    client: &str,
    total: usize,
    succeeded: usize,
    failed: &[&str],
) -> String {
    match status {
        OverallStatus::Success => {
            format!("Project analysis for {client} completed: all {total} agents succeeded.")
        }
        OverallStatus::PartialSuccess => format!(
            "Project analysis for {client} partially completed: {succeeded} of {total} agents succeeded, {} failed ({}).",
            failed.len(),
            failed.join(", ")
        ),
        OverallStatus::Failure if failed.is_empty() => {
            format!("Project analysis for {client} failed: no agents were run.")
        }
        OverallStatus::Failure => format!(
            "Project analysis for {client} failed: all {total} agents failed ({}).",
            failed.join(", ")
        ),
    }
}
