//! Orchestration core: dependency-aware, bounded-concurrency execution of
//! analysis agents with partial-failure tolerance.
//!
//! A project brief enters through [`Orchestrator::process`], runs wave by
//! wave through the [`Scheduler`] according to the [`DependencyGraph`], and
//! the per-agent outcomes are merged by the [`Aggregator`] into one
//! [`ConsolidatedOutput`].
//!
//! # Main types
//!
//! - [`Orchestrator`] — Request entry point; validates, schedules, aggregates.
//! - [`AgentRegistry`] — Ordered, read-only set of agents built at startup.
//! - [`DependencyGraph`] — Validated acyclic dependency declaration split into waves.
//! - [`Scheduler`] — Executes waves with a concurrency ceiling, timeouts and retries.
//! - [`Aggregator`] — Builds the consolidated output and overall status.
//! - [`OrchestratorConfig`] — Concurrency, timeout and retry settings.

/// Result aggregation and overall status.
pub mod aggregator;
/// Orchestrator settings and retry policy.
pub mod config;
/// Request entry point.
pub mod engine;
/// Dependency graph validation and wave layout.
pub mod graph;
/// Agent registry.
pub mod registry;
/// Wave-based agent execution.
pub mod scheduler;
/// Output types (ConsolidatedOutput, OverallStatus).
pub mod types;

pub use aggregator::{resolve_status, Aggregator};
pub use config::{OrchestratorConfig, RetryPolicy};
pub use engine::Orchestrator;
pub use graph::DependencyGraph;
pub use registry::AgentRegistry;
pub use scheduler::Scheduler;
pub use types::{ConsolidatedOutput, OverallStatus};
