use serde::{Deserialize, Serialize};

use crate::domain::analysis::{EmotionRiskAnalysis, IntentAnalysis, StrategyDecision};

/// One prior turn of the conversation, supplied by the caller per request.
/// The pipeline never inspects turns beyond rendering them into the
/// response-generation prompt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), history: Vec::new() }
    }

    /// Textual rendering of the history for `{{history}}` substitution.
    pub fn render_history(&self) -> String {
        serde_json::to_string(&self.history).unwrap_or_default()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub intent_analysis: IntentAnalysis,
    pub emotion_analysis: EmotionRiskAnalysis,
    pub strategy_decision: StrategyDecision,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_defaults_to_empty_on_deserialization() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"message":"where is my order?"}"#).expect("valid request");
        assert!(request.history.is_empty());
    }

    #[test]
    fn history_renders_as_json_text() {
        let mut request = ChatRequest::new("hello");
        request.history.push(HistoryTurn {
            role: "user".to_string(),
            content: "hi".to_string(),
        });

        let rendered = request.render_history();
        assert!(rendered.contains(r#""role":"user""#));
        assert!(rendered.contains(r#""content":"hi""#));
    }
}
