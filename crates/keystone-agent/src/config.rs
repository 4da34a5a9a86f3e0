use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// Google Generative Language API (Gemini for text, Imagen for images).
    #[default]
    Gemini,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: ModelProvider,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_image_model_id")]
    pub image_model_id: String,
    /// May be left empty in the config file and supplied through the
    /// environment at startup.
    #[serde(default)]
    pub api_key: String,
    pub api_base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Transport-level timeout for a single HTTP call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model_id() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_image_model_id() -> String {
    "imagen-3.0-generate-002".to_string()
}

fn default_temperature() -> f32 {
    0.4
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_request_timeout_secs() -> u64 {
    90
}

impl ModelConfig {
    /// A config for `provider` with every other field at its default.
    pub fn new(provider: ModelProvider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            model_id: default_model_id(),
            image_model_id: default_image_model_id(),
            api_key: api_key.into(),
            api_base_url: None,
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url.trim_end_matches('/')
        } else {
            match self.provider {
                ModelProvider::Gemini => "https://generativelanguage.googleapis.com",
            }
        }
    }
}
