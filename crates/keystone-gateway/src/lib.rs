//! HTTP surface for the Keystone orchestrator.
//!
//! A thin axum layer: it decodes a project brief, hands it to a shared
//! [`keystone_orchestrator::Orchestrator`] and returns the consolidated
//! output. No orchestration logic lives here.

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::GatewayServer;
