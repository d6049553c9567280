//! Single abstraction point between the pipeline and whichever backend was
//! selected at startup. Provider failures never propagate: they are logged
//! and absorbed into an empty string, which every stage treats as "nothing
//! generated". No retries at this layer.

use std::sync::Arc;

use tracing::error;

use crate::llm::LlmClient;

/// Near-deterministic sampling for the three analysis stages.
pub const ANALYSIS_TEMPERATURE: f32 = 0.1;
/// Higher variety for free-text reply generation.
pub const REPLY_TEMPERATURE: f32 = 0.7;

#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<dyn LlmClient>,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn provider_name(&self) -> &'static str {
        self.client.name()
    }

    pub async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> String {
        match self.client.complete(system_prompt, user_prompt, temperature).await {
            Ok(text) => text,
            Err(source) => {
                error!(
                    event_name = "dispatcher.provider_failed",
                    provider = self.client.name(),
                    error = %source,
                    "provider call failed; degrading to empty output"
                );
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use super::*;

    struct EchoClient;

    #[async_trait]
    impl LlmClient for EchoClient {
        async fn complete(
            &self,
            _system_prompt: &str,
            user_prompt: &str,
            _temperature: f32,
        ) -> Result<String> {
            Ok(format!("echo: {user_prompt}"))
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    struct BrokenClient;

    #[async_trait]
    impl LlmClient for BrokenClient {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _temperature: f32,
        ) -> Result<String> {
            Err(anyhow!("connection refused"))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn successful_completion_passes_through() {
        let dispatcher = Dispatcher::new(Arc::new(EchoClient));
        let text = dispatcher.generate("system", "hello", ANALYSIS_TEMPERATURE).await;
        assert_eq!(text, "echo: hello");
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_empty_string() {
        let dispatcher = Dispatcher::new(Arc::new(BrokenClient));
        let text = dispatcher.generate("system", "hello", REPLY_TEMPERATURE).await;
        assert!(text.is_empty());
    }
}
