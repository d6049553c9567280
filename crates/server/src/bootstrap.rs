use std::sync::Arc;

use careline_agent::{providers, ChatPipeline};
use careline_core::config::AppConfig;
use careline_core::config::ConfigError;
use careline_core::prompts::PromptLibrary;
use thiserror::Error;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    pub pipeline: Arc<ChatPipeline>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("prompt library load failed: {0}")]
    Prompts(#[source] std::io::Error),
    #[error("llm provider construction failed: {0}")]
    Provider(#[source] anyhow::Error),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        provider = config.llm.provider.as_str(),
        "starting application bootstrap"
    );

    let prompts = PromptLibrary::load(&config.prompts.dir).map_err(BootstrapError::Prompts)?;
    let missing = prompts.missing();
    if missing.is_empty() {
        info!(
            event_name = "system.bootstrap.prompts_loaded",
            correlation_id = "bootstrap",
            "all prompt templates loaded"
        );
    } else {
        // Missing templates are a degrade, not a fatal configuration error:
        // the affected stages resolve to fallback rules.
        warn!(
            event_name = "system.bootstrap.prompts_missing",
            correlation_id = "bootstrap",
            missing = %missing.join(", "),
            "some prompt templates resolved to empty strings"
        );
    }

    let client = providers::build_client(&config.llm).map_err(BootstrapError::Provider)?;
    let pipeline = Arc::new(ChatPipeline::new(client, prompts));

    Ok(Application { config, pipeline })
}
