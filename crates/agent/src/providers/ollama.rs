//! Local inference over an Ollama server.
//!
//! System and user prompts are concatenated into one prompt body, matching
//! the single-prompt generate interface. Warm-up runs once per process on
//! first use and is cached; every generate call is bounded by an explicit
//! timeout so local latency cannot exceed the remote path's budget.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use careline_core::config::LlmConfig;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::llm::LlmClient;

pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
    warmup: OnceCell<()>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaClient {
    pub fn new(base_url: String, config: &LlmConfig) -> Result<Self> {
        // No reqwest-level timeout: the generate call is wrapped in a single
        // explicit tokio timeout instead, so there is one budget to reason
        // about.
        let client = Client::builder().build().context("failed to build http client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            warmup: OnceCell::new(),
        })
    }

    /// Confirm the server is reachable and report whether the configured
    /// model is present. Runs once; a failed attempt is retried on the next
    /// call rather than cached.
    async fn ensure_ready(&self) -> Result<()> {
        self.warmup
            .get_or_try_init(|| async {
                let models = list_models(&self.base_url, self.timeout.as_secs()).await?;
                if models.iter().any(|model| model == &self.model) {
                    info!(model = %self.model, "ollama model available");
                } else {
                    warn!(
                        model = %self.model,
                        available = models.len(),
                        "configured model not in ollama tag list; generate may trigger a load failure"
                    );
                }
                Ok::<(), anyhow::Error>(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String> {
        self.ensure_ready().await?;

        let prompt = format!("{system_prompt}\n\n{user_prompt}");
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": temperature },
        });

        let url = format!("{}/api/generate", self.base_url);
        debug!(model = %self.model, "ollama generate request");

        let send = async {
            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .with_context(|| format!("generate request to {url} failed"))?;

            let status = response.status();
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                bail!("ollama generate returned {status}: {detail}");
            }

            let payload: GenerateResponse =
                response.json().await.context("ollama generate response was not valid JSON")?;
            Ok(payload.response)
        };

        tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| anyhow!("local generation exceeded {}s budget", self.timeout.as_secs()))?
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

pub(crate) async fn list_models(base_url: &str, timeout_secs: u64) -> Result<Vec<String>> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build http client")?;

    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("tag listing request to {url} failed"))?;

    if !response.status().is_success() {
        bail!("ollama tag listing returned {}", response.status());
    }

    let tags: TagsResponse =
        response.json().await.context("ollama tag response was not valid JSON")?;
    Ok(tags.models.into_iter().map(|model| model.name).collect())
}

#[cfg(test)]
mod tests {
    use careline_core::config::AppConfig;

    use super::*;

    #[tokio::test]
    async fn unreachable_server_surfaces_an_error_not_a_hang() {
        let mut llm = AppConfig::default().llm;
        llm.timeout_secs = 1;
        let client =
            OllamaClient::new("http://127.0.0.1:1".to_string(), &llm).expect("client should build");

        let result = client.complete("system", "user", 0.1).await;
        assert!(result.is_err());
    }

    #[test]
    fn base_url_is_normalized() {
        let llm = AppConfig::default().llm;
        let client =
            OllamaClient::new("http://localhost:11434/".to_string(), &llm).expect("build");
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.name(), "ollama");
    }
}
