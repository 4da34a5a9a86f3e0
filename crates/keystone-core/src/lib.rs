//! Core contracts and error definitions for the Keystone analysis pipeline.
//!
//! This crate holds the types shared by every other Keystone crate: the
//! project brief submitted by a client, the context an agent sees when it
//! runs, the tagged outcome each agent produces, and the error taxonomy that
//! separates request-level failures from per-agent failures.
//!
//! # Main types
//!
//! - [`ProjectInput`] — The construction-project brief, validated once per request.
//! - [`AgentCapability`] — The single interface every analysis agent implements.
//! - [`AgentContext`] — Project brief plus the outputs of an agent's declared dependencies.
//! - [`AgentResult`] — `Success` or `Failure` outcome recorded for one agent.
//! - [`KeystoneError`] — Unified error enum for request and configuration failures.
//! - [`AgentError`] — Failure scoped to a single agent invocation.

/// Agent contract, execution context, and per-agent outcomes.
pub mod agent;
/// Error taxonomy shared by all crates.
pub mod error;
/// Project brief and its structural validation.
pub mod input;

pub use agent::{AgentCapability, AgentContext, AgentResult, UpstreamOutput};
pub use error::{
    AgentError, AgentErrorKind, FieldViolation, GraphError, KeystoneError, KeystoneResult,
    ValidationError,
};
pub use input::ProjectInput;
