//! Model-service plumbing for Keystone agents.
//!
//! Agents reach the external generative-model service only through the
//! [`ModelClient`] trait. The concrete backend is chosen from
//! [`ModelConfig`] at startup by [`build_client`].

pub mod backends;
pub mod client;
pub mod config;

pub use client::{build_client, GenerationParams, ModelClient, ModelError, ModelResult};
pub use config::{ModelConfig, ModelProvider};
