pub mod config;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod fallback;
pub mod prompts;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions};
pub use domain::{
    ChatRequest, ChatResponse, EmotionRiskAnalysis, HistoryTurn, IntentAnalysis, StrategyDecision,
};
pub use errors::ShapeError;
pub use extract::extract_json;
pub use prompts::PromptLibrary;
