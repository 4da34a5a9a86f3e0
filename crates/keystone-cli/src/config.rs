//! `keystone.toml` loading.

use keystone_agent::{ModelConfig, ModelProvider};
use keystone_orchestrator::OrchestratorConfig;
use serde::Deserialize;
use std::path::Path;

/// Environment variable consulted when `[model].api_key` is empty.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Deserialize)]
pub struct KeystoneConfig {
    #[serde(default = "default_model")]
    pub model: ModelConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_model() -> ModelConfig {
    ModelConfig::new(ModelProvider::Gemini, "")
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}

impl KeystoneConfig {
    /// Read and parse the config file. A missing file yields the defaults.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Self::parse(&text)
                .map_err(|e| anyhow::anyhow!("Invalid config file '{}': {e}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::parse(""),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file '{}': {e}",
                path.display()
            )),
        }
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: KeystoneConfig = toml::from_str(text)?;
        config.orchestrator.validate()?;
        Ok(config)
    }

    /// Fill an empty API key from `env_value`.
    pub fn apply_api_key_fallback(&mut self, env_value: Option<String>) {
        if self.model.api_key.trim().is_empty() {
            if let Some(key) = env_value.filter(|k| !k.trim().is_empty()) {
                self.model.api_key = key;
            }
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.model.api_key.trim().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = KeystoneConfig::parse("").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.model.model_id, "gemini-1.5-flash");
        assert_eq!(config.orchestrator.concurrency_limit, 4);
        assert!(!config.has_api_key());
    }

    #[test]
    fn sections_override_defaults() {
        let config = KeystoneConfig::parse(
            r#"
            [model]
            provider = "gemini"
            api_key = "file-key"
            model_id = "gemini-1.5-pro"

            [orchestrator]
            concurrency_limit = 8
            agent_timeout_secs = 60

            [orchestrator.retry]
            max_retries = 5

            [server]
            port = 9090
            "#,
        )
        .unwrap();
        assert_eq!(config.model.model_id, "gemini-1.5-pro");
        assert_eq!(config.orchestrator.concurrency_limit, 8);
        assert_eq!(config.orchestrator.retry.max_retries, 5);
        assert_eq!(config.orchestrator.retry.backoff_base_ms, 500);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = KeystoneConfig::parse("[orchestrator]\nconcurrency_limit = 0\n").unwrap_err();
        assert!(err.to_string().contains("concurrency_limit"));
    }

    #[test]
    fn env_key_fills_only_empty_key() {
        let mut config = KeystoneConfig::parse("").unwrap();
        config.apply_api_key_fallback(Some("env-key".into()));
        assert_eq!(config.model.api_key, "env-key");

        let mut config = KeystoneConfig::parse("[model]\napi_key = \"file-key\"\n").unwrap();
        config.apply_api_key_fallback(Some("env-key".into()));
        assert_eq!(config.model.api_key, "file-key");

        let mut config = KeystoneConfig::parse("").unwrap();
        config.apply_api_key_fallback(Some("  ".into()));
        assert!(!config.has_api_key());
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let config = KeystoneConfig::load(Path::new("/nonexistent/keystone.toml"))
            .await
            .unwrap();
        assert_eq!(config.server.port, 8000);
    }
}
