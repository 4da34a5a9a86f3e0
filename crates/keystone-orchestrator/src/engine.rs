use crate::aggregator::Aggregator;
use crate::config::OrchestratorConfig;
use crate::graph::DependencyGraph;
use crate::registry::AgentRegistry;
use crate::scheduler::Scheduler;
use crate::types::ConsolidatedOutput;
use keystone_core::{KeystoneError, KeystoneResult, ProjectInput};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Entry point for project analysis requests.
///
/// Construction validates the agent roster and dependency graph once; after
/// that the orchestrator is immutable and can serve concurrent requests,
/// each with its own isolated context.
pub struct Orchestrator {
    registry: AgentRegistry,
    graph: DependencyGraph,
    scheduler: Scheduler,
    aggregator: Aggregator,
}

impl Orchestrator {
    /// Validate `config` and the roster, and build the dependency graph.
    ///
    /// The scheduler built here owns the concurrency budget shared by every
    /// request this orchestrator serves.
    pub fn new(registry: AgentRegistry, config: OrchestratorConfig) -> KeystoneResult<Self> {
        config.validate()?;
        if registry.is_empty() {
            return Err(KeystoneError::Config("no agents registered".into()));
        }
        let graph = registry.dependency_graph()?;
        info!(
            agents = graph.len(),
            waves = graph.waves().len(),
            concurrency_limit = config.concurrency_limit,
            "Orchestrator ready"
        );
        Ok(Self {
            scheduler: Scheduler::new(&config),
            aggregator: Aggregator::new(&registry),
            registry,
            graph,
        })
    }

    /// Replace the scheduler, keeping the validated roster and graph.
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// The registered agents.
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// The validated dependency graph.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Validate `input`, run every agent and return the consolidated output.
    ///
    /// The only error is a validation failure, raised before any agent runs.
    /// Agent failures are reported inside the output.
    pub async fn process(&self, input: ProjectInput) -> KeystoneResult<ConsolidatedOutput> {
        let input = input.normalized()?;
        let request_id = Uuid::new_v4();
        let span = info_span!("process", request_id = %request_id);

        async move {
            let start = Instant::now();
            info!(
                client = %input.client_name,
                project_type = %input.project_type,
                "Processing project brief"
            );

            let shared = Arc::new(input);
            let results = self
                .scheduler
                .run(&self.registry, &self.graph, Arc::clone(&shared))
                .await;
            let input = Arc::try_unwrap(shared).unwrap_or_else(|arc| (*arc).clone());
            let output = self.aggregator.aggregate(input, results);

            info!(
                status = %output.overall_status,
                succeeded = output.succeeded_count(),
                failed = output.failed_count(),
                duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Project analysis complete"
            );
            Ok(output)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::OverallStatus;
    use async_trait::async_trait;
    use keystone_core::{AgentCapability, AgentContext, AgentError, GraphError};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Echo {
        name: &'static str,
        deps: &'static [&'static str],
    }

    #[async_trait]
    impl AgentCapability for Echo {
        fn name(&self) -> &str {
            self.name
        }
        fn output_key(&self) -> &str {
            self.name
        }
        fn dependencies(&self) -> &[&'static str] {
            self.deps
        }
        async fn execute(&self, ctx: &AgentContext) -> Result<Value, AgentError> {
            Ok(json!({ "client": ctx.input().client_name }))
        }
    }

    fn brief() -> ProjectInput {
        ProjectInput {
            project_type: "Residential".into(),
            client_name: "  Jane Roe ".into(),
            budget_range: "$1M-$2M".into(),
            location: "Austin, TX".into(),
            desired_features: vec!["Solar".into()],
            initial_ideas_url: None,
            project_description: "Two-storey family home".into(),
            project_size: "3000 sq ft".into(),
        }
    }

    fn registry(agents: Vec<Echo>) -> AgentRegistry {
        let mut registry = AgentRegistry::new();
        for agent in agents {
            registry.register(Arc::new(agent));
        }
        registry
    }

    #[tokio::test]
    async fn processes_normalized_input() {
        let orchestrator = Orchestrator::new(
            registry(vec![
                Echo { name: "a", deps: &[] },
                Echo { name: "b", deps: &["a"] },
            ]),
            OrchestratorConfig::default(),
        )
        .unwrap();

        let output = orchestrator.process(brief()).await.unwrap();
        assert_eq!(output.overall_status, OverallStatus::Success);
        assert_eq!(output.user_input_received.client_name, "Jane Roe");
        assert_eq!(output.consolidated_project_data["b"], json!({ "client": "Jane Roe" }));
    }

    #[derive(Default)]
    struct Slow {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl AgentCapability for Slow {
        fn name(&self) -> &str {
            "slow"
        }
        fn output_key(&self) -> &str {
            "slow"
        }
        async fn execute(&self, _ctx: &AgentContext) -> Result<Value, AgentError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(json!({}))
        }
    }

    #[tokio::test]
    async fn concurrent_requests_share_concurrency_limit() {
        let slow = Arc::new(Slow::default());
        let mut registry = AgentRegistry::new();
        registry.register(slow.clone());
        let config = OrchestratorConfig {
            concurrency_limit: 1,
            ..OrchestratorConfig::default()
        };
        let orchestrator = Orchestrator::new(registry, config).unwrap();

        let (a, b, c) = tokio::join!(
            orchestrator.process(brief()),
            orchestrator.process(brief()),
            orchestrator.process(brief())
        );

        for output in [a, b, c] {
            assert_eq!(output.unwrap().overall_status, OverallStatus::Success);
        }
        assert_eq!(slow.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_input_fails_before_any_agent() {
        let orchestrator = Orchestrator::new(
            registry(vec![Echo { name: "a", deps: &[] }]),
            OrchestratorConfig::default(),
        )
        .unwrap();
        let mut input = brief();
        input.location = "   ".into();

        match orchestrator.process(input).await {
            Err(KeystoneError::Validation(v)) => assert!(v.has_field("location")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn cyclic_roster_is_rejected_at_construction() {
        let result = Orchestrator::new(
            registry(vec![
                Echo { name: "A", deps: &["B"] },
                Echo { name: "B", deps: &["A"] },
            ]),
            OrchestratorConfig::default(),
        );
        match result {
            Err(KeystoneError::Graph(GraphError::Cycle { path })) => {
                assert_eq!(path, vec!["A", "B", "A"]);
            }
            Err(other) => panic!("expected cycle error, got {other:?}"),
            Ok(_) => panic!("expected cycle error"),
        }
    }

    #[test]
    fn empty_roster_is_rejected() {
        let result = Orchestrator::new(AgentRegistry::new(), OrchestratorConfig::default());
        assert!(matches!(result, Err(KeystoneError::Config(_))));
    }
}
