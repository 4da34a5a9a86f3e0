use crate::graph::DependencyGraph;
use keystone_core::{AgentCapability, GraphError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Ordered set of the agents available to the orchestrator.
///
/// Built once at startup and read-only afterwards. Registration order is the
/// tie-break for scheduling within a wave and for summary listings.
pub struct AgentRegistry {
    agents: Vec<Arc<dyn AgentCapability>>,
}

impl AgentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { agents: Vec::new() }
    }

    /// Append an agent. Duplicate names are reported by [`Self::dependency_graph`].
    pub fn register(&mut self, agent: Arc<dyn AgentCapability>) {
        info!(
            agent = %agent.name(),
            output_key = %agent.output_key(),
            dependencies = agent.dependencies().len(),
            "Registered agent"
        );
        self.agents.push(agent);
    }

    /// Look up an agent by registry name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn AgentCapability>> {
        self.agents.iter().find(|a| a.name() == name)
    }

    /// Agent names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    /// Agents in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn AgentCapability>> {
        self.agents.iter()
    }

    /// Number of registered agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agent is registered.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Validate the registered agents and derive their dependency graph.
    ///
    /// Rejects duplicate names, duplicate output keys, unknown dependencies
    /// and cycles.
    pub fn dependency_graph(&self) -> Result<DependencyGraph, GraphError> {
        let mut keys: HashMap<&str, &str> = HashMap::new();
        for agent in &self.agents {
            if let Some(first) = keys.insert(agent.output_key(), agent.name()) {
                if first != agent.name() {
                    return Err(GraphError::DuplicateOutputKey {
                        key: agent.output_key().to_string(),
                        first: first.to_string(),
                        second: agent.name().to_string(),
                    });
                }
            }
        }

        DependencyGraph::new(
            self.agents
                .iter()
                .map(|a| (a.name(), a.dependencies().to_vec())),
        )
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
