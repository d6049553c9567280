//! Concrete backends and the startup factory that selects one.

pub mod ollama;
pub mod openai;

use std::sync::Arc;

use anyhow::{bail, Result};
use careline_core::config::{LlmConfig, LlmProvider};
use secrecy::ExposeSecret;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Resolve the configured provider into a concrete client, once, at startup.
/// The returned handle is shared across all requests; no per-request
/// provider branching happens after this point.
pub fn build_client(config: &LlmConfig) -> Result<Arc<dyn crate::LlmClient>> {
    match config.provider {
        LlmProvider::Ollama => {
            let base_url = config.base_url.clone().unwrap_or_else(|| OLLAMA_BASE_URL.to_string());
            Ok(Arc::new(OllamaClient::new(base_url, config)?))
        }
        LlmProvider::OpenAi => {
            let base_url = config.base_url.clone().unwrap_or_else(|| OPENAI_BASE_URL.to_string());
            Ok(Arc::new(OpenAiClient::new("openai", base_url, config)?))
        }
        LlmProvider::DashScope => {
            let base_url =
                config.base_url.clone().unwrap_or_else(|| DASHSCOPE_BASE_URL.to_string());
            Ok(Arc::new(OpenAiClient::new("dashscope", base_url, config)?))
        }
    }
}

/// Readiness probe for operator tooling. Local backends are queried for
/// their model list; remote backends are checked for credential presence
/// without spending a paid completion.
pub async fn probe(config: &LlmConfig) -> Result<String> {
    match config.provider {
        LlmProvider::Ollama => {
            let base_url = config.base_url.clone().unwrap_or_else(|| OLLAMA_BASE_URL.to_string());
            let models = ollama::list_models(&base_url, config.timeout_secs).await?;
            if models.iter().any(|model| model == &config.model) {
                Ok(format!("ollama reachable at {base_url}; model `{}` available", config.model))
            } else {
                Ok(format!(
                    "ollama reachable at {base_url}; model `{}` not pulled yet ({} models present)",
                    config.model,
                    models.len()
                ))
            }
        }
        LlmProvider::OpenAi | LlmProvider::DashScope => {
            let key_present = config
                .api_key
                .as_ref()
                .is_some_and(|key| !key.expose_secret().trim().is_empty());
            if !key_present {
                bail!("api key missing for provider `{}`", config.provider.as_str());
            }
            let base_url = config.base_url.clone().unwrap_or_else(|| match config.provider {
                LlmProvider::DashScope => DASHSCOPE_BASE_URL.to_string(),
                _ => OPENAI_BASE_URL.to_string(),
            });
            Ok(format!(
                "api key configured for `{}` against {base_url}",
                config.provider.as_str()
            ))
        }
    }
}
