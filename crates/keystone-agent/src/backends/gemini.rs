use super::{classify_status, classify_transport};
use crate::client::{GenerationParams, ModelClient, ModelError, ModelResult};
use crate::config::ModelConfig;
use async_trait::async_trait;
use base64::Engine;
use keystone_core::{KeystoneError, KeystoneResult};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "Gemini";

/// Google Generative Language API backend.
///
/// Text goes through `models/{model_id}:generateContent`, images through
/// Imagen's `models/{image_model_id}:predict`.
pub struct GeminiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(config: ModelConfig) -> KeystoneResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| KeystoneError::Http(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{model}:{method}", self.config.base_url())
    }

    fn text_body(&self, prompt: &str, params: &GenerationParams) -> Value {
        let mut generation_config = json!({
            "temperature": params.temperature.unwrap_or(self.config.temperature),
            "maxOutputTokens": self.config.max_output_tokens,
        });
        if params.json_response {
            generation_config["responseMimeType"] = json!("application/json");
        }
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": generation_config,
        })
    }

    async fn post(&self, url: &str, body: &Value) -> ModelResult<Value> {
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_transport(PROVIDER, e))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| classify_transport(PROVIDER, e))?;

        if !status.is_success() {
            return Err(classify_status(PROVIDER, status, &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| ModelError::InvalidPayload(format!("{PROVIDER}: {e}")))
    }
}

/// Extract the generated text from a `generateContent` response.
pub fn parse_text_response(body: &Value) -> ModelResult<String> {
    if let Some(reason) = body
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(ModelError::Permanent(format!("prompt blocked: {reason}")));
    }

    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| ModelError::EmptyResponse("no candidates in response".into()))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        let finish = body
            .pointer("/candidates/0/finishReason")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        return Err(ModelError::EmptyResponse(format!(
            "candidate has no text (finish reason: {finish})"
        )));
    }
    Ok(text)
}

/// Extract the base64 image from a `predict` response, checking that it decodes.
pub fn parse_image_response(body: &Value) -> ModelResult<String> {
    let encoded = body
        .pointer("/predictions/0/bytesBase64Encoded")
        .and_then(Value::as_str)
        .ok_or_else(|| ModelError::EmptyResponse("no image in response".into()))?;

    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| ModelError::InvalidPayload(format!("image is not valid base64: {e}")))?;

    Ok(encoded.to_string())
}

#[async_trait]
impl ModelClient for GeminiBackend {
    async fn generate_text(&self, prompt: &str, params: &GenerationParams) -> ModelResult<String> {
        let url = self.endpoint(&self.config.model_id, "generateContent");
        debug!(model = %self.config.model_id, prompt_len = prompt.len(), "Gemini text request");
        let body = self.post(&url, &self.text_body(prompt, params)).await?;
        parse_text_response(&body)
    }

    async fn generate_image(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> ModelResult<String> {
        let url = self.endpoint(&self.config.image_model_id, "predict");
        debug!(model = %self.config.image_model_id, "Imagen request");
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": { "sampleCount": 1 },
        });
        let body = self.post(&url, &body).await?;
        parse_image_response(&body)
    }
}
