use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use careline_agent::{providers, ChatPipeline};
use careline_core::config::{AppConfig, LoadOptions};
use careline_core::domain::{ChatRequest, HistoryTurn};
use careline_core::prompts::PromptLibrary;

use crate::commands::CommandResult;

pub fn run(message: String, history_file: Option<PathBuf>) -> CommandResult {
    match execute(message, history_file) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult { exit_code: 1, output: format!("chat failed: {error:#}") },
    }
}

fn execute(message: String, history_file: Option<PathBuf>) -> Result<String> {
    let config = AppConfig::load(LoadOptions::default())?;
    let history = load_history(history_file)?;

    let prompts = PromptLibrary::load(&config.prompts.dir)
        .context("could not load prompt templates")?;
    let client = providers::build_client(&config.llm)?;
    let pipeline = ChatPipeline::new(client, prompts);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("could not build tokio runtime")?;

    let response =
        runtime.block_on(pipeline.process(&ChatRequest { message, history }));

    serde_json::to_string_pretty(&response).context("could not serialize response")
}

fn load_history(history_file: Option<PathBuf>) -> Result<Vec<HistoryTurn>> {
    let Some(path) = history_file else {
        return Ok(Vec::new());
    };
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("could not read history file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("history file `{}` is not a JSON turn list", path.display()))
}
