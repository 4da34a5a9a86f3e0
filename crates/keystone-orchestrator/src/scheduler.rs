use crate::config::{OrchestratorConfig, RetryPolicy};
use crate::graph::DependencyGraph;
use crate::registry::AgentRegistry;
use keystone_core::{AgentCapability, AgentContext, AgentError, AgentResult, ProjectInput};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const DEADLINE_EXCEEDED: &str = "request deadline exceeded";

/// Runs the agents of a request wave by wave.
///
/// A wave starts only after every agent of the previous wave has finished,
/// successfully or not. At most `concurrency_limit` agents are in flight at
/// once across every request sharing this scheduler (clones share the same
/// permits). Each agent gets a single timeout covering all of its attempts;
/// only transient service errors are retried.
#[derive(Debug, Clone)]
pub struct Scheduler {
    concurrency_limit: usize,
    permits: Arc<Semaphore>,
    agent_timeout: Duration,
    request_timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl Scheduler {
    /// Build a scheduler from `config`. The limit is clamped to
    /// `1..=Semaphore::MAX_PERMITS`.
    pub fn new(config: &OrchestratorConfig) -> Self {
        let concurrency_limit = config.concurrency_limit.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            concurrency_limit,
            permits: Arc::new(Semaphore::new(concurrency_limit)),
            agent_timeout: Duration::from_secs(config.agent_timeout_secs),
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
            retry: config.retry.clone(),
        }
    }

    /// Override the per-agent timeout.
    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }

    /// Override the whole-request deadline; `None` disables it.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Maximum number of agents in flight at once.
    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Permits currently free in the shared concurrency budget.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Execute every agent of `graph` and return exactly one result per
    /// agent, in declaration order.
    ///
    /// Never fails: agent errors, timeouts and an expired request deadline
    /// are all recorded as failure results.
    pub async fn run(
        &self,
        agents: &AgentRegistry,
        graph: &DependencyGraph,
        input: Arc<ProjectInput>,
    ) -> Vec<AgentResult> {
        // A deadline too far out to represent is no deadline.
        let deadline = self
            .request_timeout
            .and_then(|t| Instant::now().checked_add(t));
        let mut completed: HashMap<String, AgentResult> = HashMap::with_capacity(graph.len());
        let mut expired = false;

        for (wave_index, wave) in graph.waves().into_iter().enumerate() {
            if !expired && deadline.is_some_and(|d| Instant::now() >= d) {
                expired = true;
            }
            if expired {
                for name in wave {
                    completed.insert(name.to_string(), deadline_failure(name));
                }
                continue;
            }

            debug!(wave = wave_index, agents = wave.len(), "Dispatching wave");
            let mut pending: BTreeSet<&str> = BTreeSet::new();
            let mut tasks = JoinSet::new();

            for name in wave {
                let Some(agent) = agents.get(name) else {
                    completed.insert(
                        name.to_string(),
                        AgentResult::failure(name, AgentError::permanent("agent is not registered")),
                    );
                    continue;
                };
                let ctx = upstream_context(&input, graph, name, &completed);
                pending.insert(name);
                tasks.spawn(invoke(
                    Arc::clone(agent),
                    ctx,
                    Arc::clone(&self.permits),
                    self.agent_timeout,
                    self.retry.clone(),
                ));
            }

            loop {
                let joined = match deadline {
                    Some(d) => match tokio::time::timeout_at(d, tasks.join_next()).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            warn!(
                                wave = wave_index,
                                in_flight = pending.len(),
                                "Request deadline exceeded, cancelling remaining agents"
                            );
                            expired = true;
                            tasks.abort_all();
                            break;
                        }
                    },
                    None => tasks.join_next().await,
                };
                match joined {
                    None => break,
                    Some(Ok(result)) => {
                        pending.remove(result.agent_name());
                        completed.insert(result.agent_name().to_string(), result);
                    }
                    Some(Err(e)) => {
                        warn!(wave = wave_index, error = %e, "Agent task did not complete");
                    }
                }
            }

            for name in pending {
                let result = if expired {
                    deadline_failure(name)
                } else {
                    AgentResult::failure(name, AgentError::permanent("agent task aborted"))
                };
                completed.insert(name.to_string(), result);
            }
        }

        graph
            .names()
            .filter_map(|name| completed.remove(name))
            .collect()
    }
}

fn deadline_failure(name: &str) -> AgentResult {
    AgentResult::failure(name, AgentError::timeout(DEADLINE_EXCEEDED))
}

/// Context for `name`: the brief plus the outcome of each direct dependency.
fn upstream_context(
    input: &Arc<ProjectInput>,
    graph: &DependencyGraph,
    name: &str,
    completed: &HashMap<String, AgentResult>,
) -> AgentContext {
    let mut ctx = AgentContext::new(Arc::clone(input));
    for dep in graph.dependencies(name).unwrap_or_default() {
        if let Some(result) = completed.get(dep) {
            ctx = ctx.with_upstream(dep, result.as_upstream());
        }
    }
    ctx
}

async fn invoke(
    agent: Arc<dyn AgentCapability>,
    ctx: AgentContext,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
    retry: RetryPolicy,
) -> AgentResult {
    let name = agent.name().to_string();
    let Ok(_permit) = semaphore.acquire_owned().await else {
        return AgentResult::failure(name, AgentError::permanent("scheduler is shutting down"));
    };

    let started = Instant::now();
    let outcome =
        match tokio::time::timeout(timeout, execute_with_retry(agent.as_ref(), &ctx, &retry)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(AgentError::timeout(format!(
                "agent did not finish within {}ms",
                timeout.as_millis()
            ))),
        };
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match &outcome {
        Ok(_) => info!(agent = %name, elapsed_ms, "Agent completed"),
        Err(e) => warn!(
            agent = %name,
            error_kind = %e.kind,
            error = %e.message,
            elapsed_ms,
            "Agent failed"
        ),
    }
    AgentResult::from_outcome(name, outcome)
}

async fn execute_with_retry(
    agent: &dyn AgentCapability,
    ctx: &AgentContext,
    retry: &RetryPolicy,
) -> Result<Value, AgentError> {
    let mut attempt = 0;
    loop {
        match agent.execute(ctx).await {
            Ok(data) => return Ok(data),
            Err(e) if e.is_transient() && attempt < retry.max_retries => {
                let delay = retry.backoff(attempt);
                info!(
                    agent = %agent.name(),
                    attempt = attempt + 1,
                    max_retries = retry.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e.message,
                    "Transient agent error, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use keystone_core::{AgentErrorKind, UpstreamOutput};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone)]
    enum Behavior {
        Succeed,
        Sleep(Duration),
        Fail(AgentError),
        /// Fail transiently this many times, then succeed.
        Flaky(usize),
    }

    #[derive(Default)]
    struct Probe {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        events: Mutex<Vec<String>>,
        contexts: Mutex<BTreeMap<String, BTreeMap<String, UpstreamOutput>>>,
    }

    struct ScriptedAgent {
        name: &'static str,
        deps: &'static [&'static str],
        behavior: Behavior,
        attempts: AtomicUsize,
        probe: Arc<Probe>,
    }

    #[async_trait]
    impl AgentCapability for ScriptedAgent {
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
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            let probe = &self.probe;
            probe
                .contexts
                .lock()
                .unwrap()
                .insert(self.name.to_string(), ctx.upstream().clone());
            probe.events.lock().unwrap().push(format!("start:{}", self.name));
            let now = probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            probe.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let outcome = match &self.behavior {
                Behavior::Succeed => Ok(json!({ "from": self.name })),
                Behavior::Sleep(d) => {
                    tokio::time::sleep(*d).await;
                    Ok(json!({ "from": self.name }))
                }
                Behavior::Fail(e) => Err(e.clone()),
                Behavior::Flaky(n) => {
                    if attempt < *n {
                        Err(AgentError::transient("503 from model service"))
                    } else {
                        Ok(json!({ "from": self.name, "attempt": attempt + 1 }))
                    }
                }
            };

            probe.in_flight.fetch_sub(1, Ordering::SeqCst);
            probe.events.lock().unwrap().push(format!("end:{}", self.name));
            outcome
        }
    }

    struct Fixture {
        registry: AgentRegistry,
        probe: Arc<Probe>,
        agents: Vec<Arc<ScriptedAgent>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: AgentRegistry::new(),
                probe: Arc::new(Probe::default()),
                agents: Vec::new(),
            }
        }

        fn agent(
            mut self,
            name: &'static str,
            deps: &'static [&'static str],
            behavior: Behavior,
        ) -> Self {
            let agent = Arc::new(ScriptedAgent {
                name,
                deps,
                behavior,
                attempts: AtomicUsize::new(0),
                probe: Arc::clone(&self.probe),
            });
            self.registry.register(agent.clone());
            self.agents.push(agent);
            self
        }

        fn attempts(&self, name: &str) -> usize {
            self.agents
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.attempts.load(Ordering::SeqCst))
                .unwrap()
        }

        fn upstream_seen_by(&self, name: &str) -> BTreeMap<String, UpstreamOutput> {
            self.probe.contexts.lock().unwrap().get(name).cloned().unwrap()
        }

        async fn run(&self, scheduler: &Scheduler) -> Vec<AgentResult> {
            let graph = self.registry.dependency_graph().unwrap();
            scheduler
                .run(&self.registry, &graph, Arc::new(ProjectInput::default()))
                .await
        }
    }

    fn scheduler(limit: usize) -> Scheduler {
        let config = OrchestratorConfig {
            concurrency_limit: limit,
            retry: RetryPolicy {
                max_retries: 2,
                backoff_base_ms: 1,
                backoff_max_ms: 5,
            },
            ..OrchestratorConfig::default()
        };
        Scheduler::new(&config)
    }

    fn failure_kind(result: &AgentResult) -> Option<AgentErrorKind> {
        match result {
            AgentResult::Failure { error_kind, .. } => Some(*error_kind),
            AgentResult::Success { .. } => None,
        }
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_limit() {
        let nap = Behavior::Sleep(Duration::from_millis(40));
        let fixture = Fixture::new()
            .agent("a", &[], nap.clone())
            .agent("b", &[], nap.clone())
            .agent("c", &[], nap.clone())
            .agent("d", &[], nap.clone())
            .agent("e", &[], nap);

        let results = fixture.run(&scheduler(3)).await;

        assert_eq!(results.len(), 5);
        assert!(results.iter().all(AgentResult::is_success));
        assert_eq!(fixture.probe.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn results_follow_declaration_order() {
        let fixture = Fixture::new()
            .agent("late", &["early"], Behavior::Succeed)
            .agent("early", &[], Behavior::Succeed)
            .agent("solo", &[], Behavior::Succeed);

        let results = fixture.run(&scheduler(4)).await;
        let names: Vec<&str> = results.iter().map(AgentResult::agent_name).collect();
        assert_eq!(names, vec!["late", "early", "solo"]);
    }

    #[tokio::test]
    async fn next_wave_waits_for_slowest_agent() {
        let fixture = Fixture::new()
            .agent("fast", &[], Behavior::Succeed)
            .agent("slow", &[], Behavior::Sleep(Duration::from_millis(60)))
            .agent("after_fast", &["fast"], Behavior::Succeed);

        fixture.run(&scheduler(4)).await;

        let events = fixture.probe.events.lock().unwrap().clone();
        let pos = |e: &str| events.iter().position(|x| x == e).unwrap();
        assert!(pos("start:after_fast") > pos("end:slow"));
        assert!(pos("start:after_fast") > pos("end:fast"));
    }

    #[tokio::test]
    async fn dependent_sees_data_and_failure_marker() {
        let fixture = Fixture::new()
            .agent("ok", &[], Behavior::Succeed)
            .agent(
                "broken",
                &[],
                Behavior::Fail(AgentError::malformed("not JSON")),
            )
            .agent("consumer", &["ok", "broken"], Behavior::Succeed);

        let results = fixture.run(&scheduler(2)).await;

        assert_eq!(failure_kind(&results[1]), Some(AgentErrorKind::MalformedAgentOutput));
        assert!(results[2].is_success(), "dependent still runs");

        let seen = fixture.upstream_seen_by("consumer");
        assert_eq!(
            seen["ok"],
            UpstreamOutput::Available {
                data: json!({ "from": "ok" })
            }
        );
        assert_eq!(
            seen["broken"],
            UpstreamOutput::Unavailable {
                error_kind: AgentErrorKind::MalformedAgentOutput
            }
        );
    }

    #[tokio::test]
    async fn slow_agent_times_out_and_dependent_runs() {
        let fixture = Fixture::new()
            .agent("stuck", &[], Behavior::Sleep(Duration::from_secs(10)))
            .agent("next", &["stuck"], Behavior::Succeed);

        let sched = scheduler(2).with_agent_timeout(Duration::from_millis(50));
        let results = fixture.run(&sched).await;

        assert_eq!(failure_kind(&results[0]), Some(AgentErrorKind::Timeout));
        assert!(results[1].is_success());
        assert_eq!(
            fixture.upstream_seen_by("next")["stuck"],
            UpstreamOutput::Unavailable {
                error_kind: AgentErrorKind::Timeout
            }
        );
    }

    #[tokio::test]
    async fn transient_errors_are_retried() {
        let fixture = Fixture::new().agent("flaky", &[], Behavior::Flaky(2));

        let results = fixture.run(&scheduler(1)).await;

        assert!(results[0].is_success());
        assert_eq!(fixture.attempts("flaky"), 3);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let fixture = Fixture::new().agent("flaky", &[], Behavior::Flaky(5));

        let results = fixture.run(&scheduler(1)).await;

        assert_eq!(
            failure_kind(&results[0]),
            Some(AgentErrorKind::TransientServiceError)
        );
        assert_eq!(fixture.attempts("flaky"), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let fixture = Fixture::new().agent(
            "rejected",
            &[],
            Behavior::Fail(AgentError::permanent("400 bad request")),
        );

        let results = fixture.run(&scheduler(1)).await;

        assert_eq!(
            failure_kind(&results[0]),
            Some(AgentErrorKind::PermanentServiceError)
        );
        assert_eq!(fixture.attempts("rejected"), 1);
    }

    #[tokio::test]
    async fn request_deadline_fails_everything_unfinished() {
        let fixture = Fixture::new()
            .agent("quick", &[], Behavior::Succeed)
            .agent("stuck", &[], Behavior::Sleep(Duration::from_secs(10)))
            .agent("downstream", &["quick"], Behavior::Succeed);

        let sched = scheduler(4).with_request_timeout(Some(Duration::from_millis(80)));
        let started = std::time::Instant::now();
        let results = fixture.run(&sched).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        for result in &results[1..] {
            match result {
                AgentResult::Failure {
                    error_kind,
                    message,
                    ..
                } => {
                    assert_eq!(*error_kind, AgentErrorKind::Timeout);
                    assert_eq!(message, DEADLINE_EXCEEDED);
                }
                other => panic!("expected deadline failure, got {other:?}"),
            }
        }
        assert_eq!(fixture.attempts("downstream"), 0, "later waves never start");
    }

    #[tokio::test]
    async fn agent_in_wave_zero_gets_empty_upstream() {
        let fixture = Fixture::new().agent("root", &[], Behavior::Succeed);
        fixture.run(&scheduler(1)).await;
        assert!(fixture.upstream_seen_by("root").is_empty());
    }

    #[tokio::test]
    async fn dependent_of_timed_out_and_healthy_agents_runs() {
        let fixture = Fixture::new()
            .agent("ok", &[], Behavior::Succeed)
            .agent("stuck", &[], Behavior::Sleep(Duration::from_secs(10)))
            .agent("consumer", &["ok", "stuck"], Behavior::Succeed);

        let sched = scheduler(2).with_agent_timeout(Duration::from_millis(50));
        let results = fixture.run(&sched).await;

        assert!(results[0].is_success());
        assert_eq!(failure_kind(&results[1]), Some(AgentErrorKind::Timeout));
        assert_eq!(results[2].agent_name(), "consumer");
        assert!(results[2].is_success());

        let seen = fixture.upstream_seen_by("consumer");
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen["ok"],
            UpstreamOutput::Available {
                data: json!({ "from": "ok" })
            }
        );
        assert_eq!(
            seen["stuck"],
            UpstreamOutput::Unavailable {
                error_kind: AgentErrorKind::Timeout
            }
        );
    }

    #[tokio::test]
    async fn concurrent_runs_share_one_budget() {
        let nap = Behavior::Sleep(Duration::from_millis(30));
        let fixture = Fixture::new()
            .agent("a", &[], nap.clone())
            .agent("b", &[], nap);
        let sched = scheduler(1);
        let clone = sched.clone();

        let (first, second) = tokio::join!(fixture.run(&sched), fixture.run(&clone));

        assert!(first.iter().chain(&second).all(AgentResult::is_success));
        assert_eq!(fixture.probe.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(sched.available_permits(), 1);
    }

    #[tokio::test]
    async fn extreme_limits_do_not_panic() {
        let config = OrchestratorConfig {
            concurrency_limit: usize::MAX,
            request_timeout_secs: Some(u64::MAX),
            ..OrchestratorConfig::default()
        };
        let sched = Scheduler::new(&config);
        assert_eq!(sched.concurrency_limit(), Semaphore::MAX_PERMITS);

        let fixture = Fixture::new()
            .agent("a", &[], Behavior::Succeed)
            .agent("b", &["a"], Behavior::Succeed);
        let results = fixture.run(&sched).await;
        assert!(results.iter().all(AgentResult::is_success));
    }
}
