use crate::backends::gemini::GeminiBackend;
use crate::config::{ModelConfig, ModelProvider};
use async_trait::async_trait;
use keystone_core::{AgentError, KeystoneResult};
use std::sync::Arc;

/// Convenience alias for model-service results.
pub type ModelResult<T> = Result<T, ModelError>;

/// Failure of a single call to the model service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Network failure, timeout, rate limiting or a 5xx; worth retrying.
    #[error("transient model service error: {0}")]
    Transient(String),

    /// The service rejected the request.
    #[error("model service rejected request: {0}")]
    Permanent(String),

    /// The service answered but produced no usable content.
    #[error("model service returned no content: {0}")]
    EmptyResponse(String),

    /// The response body could not be decoded.
    #[error("model service returned an invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<ModelError> for AgentError {
    fn from(err: ModelError) -> Self {
        let message = err.to_string();
        match err {
            ModelError::Transient(_) => AgentError::transient(message),
            ModelError::Permanent(_) => AgentError::permanent(message),
            ModelError::EmptyResponse(_) | ModelError::InvalidPayload(_) => {
                AgentError::malformed(message)
            }
        }
    }
}

/// Per-call generation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationParams {
    /// Overrides the configured temperature when set.
    pub temperature: Option<f32>,
    /// Ask the service to answer with a JSON document.
    pub json_response: bool,
}

impl GenerationParams {
    pub fn json(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            json_response: true,
        }
    }
}

/// Text and image generation, as consumed by agents.
///
/// Implementations must be safe to share across concurrently running agents.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate text for `prompt`.
    async fn generate_text(&self, prompt: &str, params: &GenerationParams) -> ModelResult<String>;

    /// Generate one image for `prompt`, returned as base64-encoded PNG.
    async fn generate_image(&self, prompt: &str, params: &GenerationParams)
        -> ModelResult<String>;
}

/// Build the backend selected by `config.provider`.
pub fn build_client(config: ModelConfig) -> KeystoneResult<Arc<dyn ModelClient>> {
    let client: Arc<dyn ModelClient> = match config.provider {
        ModelProvider::Gemini => Arc::new(GeminiBackend::new(config)?),
    };
    Ok(client)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use keystone_core::AgentErrorKind;

    #[test]
    fn model_errors_map_to_agent_error_kinds() {
        let cases = [
            (ModelError::Transient("429".into()), AgentErrorKind::TransientServiceError),
            (ModelError::Permanent("400".into()), AgentErrorKind::PermanentServiceError),
            (ModelError::EmptyResponse("none".into()), AgentErrorKind::MalformedAgentOutput),
            (ModelError::InvalidPayload("bad".into()), AgentErrorKind::MalformedAgentOutput),
        ];
        for (model_err, kind) in cases {
            let agent_err: AgentError = model_err.into();
            assert_eq!(agent_err.kind, kind);
        }
    }

    #[test]
    fn agent_error_keeps_model_message() {
        let agent_err: AgentError = ModelError::Transient("503 Service Unavailable".into()).into();
        assert!(agent_err.message.contains("503"));
        assert!(agent_err.is_transient());
    }

    #[test]
    fn build_client_for_gemini() {
        let client = build_client(ModelConfig::new(ModelProvider::Gemini, "key"));
        assert!(client.is_ok());
    }
}
