use anyhow::Result;
use async_trait::async_trait;

/// One call against a text-generation backend.
///
/// Implementations own their transport and timeout discipline; errors are
/// surfaced to the dispatcher, which absorbs them into empty output.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String>;

    fn name(&self) -> &'static str;
}
