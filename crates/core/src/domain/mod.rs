pub mod analysis;
pub mod chat;

pub use analysis::{EmotionRiskAnalysis, IntentAnalysis, StrategyDecision};
pub use chat::{ChatRequest, ChatResponse, HistoryTurn};
