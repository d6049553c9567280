use careline_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;

pub fn run() -> String {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => render(&config),
        Err(error) => format!("config load failed: {error}"),
    }
}

fn render(config: &AppConfig) -> String {
    let api_key = match &config.llm.api_key {
        Some(key) if !key.expose_secret().trim().is_empty() => "<redacted>",
        _ => "<unset>",
    };

    [
        format!("llm.provider = {}", config.llm.provider.as_str()),
        format!("llm.api_key = {api_key}"),
        format!("llm.base_url = {}", config.llm.base_url.as_deref().unwrap_or("<provider default>")),
        format!("llm.model = {}", config.llm.model),
        format!("llm.timeout_secs = {}", config.llm.timeout_secs),
        format!("server.bind_address = {}", config.server.bind_address),
        format!("server.port = {}", config.server.port),
        format!("prompts.dir = {}", config.prompts.dir.display()),
        format!("logging.level = {}", config.logging.level),
        format!("logging.format = {:?}", config.logging.format),
    ]
    .join("\n")
}
