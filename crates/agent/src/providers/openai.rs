//! OpenAI-compatible chat-completion backend.
//!
//! Also serves DashScope, whose compatible mode exposes the same wire
//! format under a different base URL.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use careline_core::config::LlmConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::llm::LlmClient;

pub struct OpenAiClient {
    provider_name: &'static str,
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl OpenAiClient {
    pub fn new(provider_name: &'static str, base_url: String, config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build http client")?;

        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("api key required for provider `{provider_name}`"))?;

        Ok(Self {
            provider_name,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": temperature,
        });

        let url = format!("{}/chat/completions", self.base_url);
        debug!(provider = self.provider_name, model = %self.model, "chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("chat completion request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("chat completion returned {status}: {detail}"));
        }

        let payload: serde_json::Value =
            response.json().await.context("chat completion response was not valid JSON")?;

        payload
            .pointer("/choices/0/message/content")
            .and_then(|content| content.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("chat completion response missing message content"))
    }

    fn name(&self) -> &'static str {
        self.provider_name
    }
}

#[cfg(test)]
mod tests {
    use careline_core::config::{AppConfig, LlmProvider};

    use super::*;

    fn remote_config() -> LlmConfig {
        let mut llm = AppConfig::default().llm;
        llm.provider = LlmProvider::OpenAi;
        llm.api_key = Some("sk-test".to_string().into());
        llm
    }

    #[test]
    fn construction_requires_api_key() {
        let mut llm = AppConfig::default().llm;
        llm.api_key = None;
        let result = OpenAiClient::new("openai", "https://api.openai.com/v1".to_string(), &llm);
        assert!(result.is_err());
    }

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let client =
            OpenAiClient::new("openai", "https://api.openai.com/v1/".to_string(), &remote_config())
                .expect("client should build");
        assert_eq!(client.base_url, "https://api.openai.com/v1");
        assert_eq!(client.name(), "openai");
    }
}
