//! Four-stage analysis pipeline: intent, emotion/risk, strategy, response.
//!
//! Stages run strictly sequentially; each stage's prompt context is built
//! from the previous stage's finalized result. Every stage is an
//! independent failure domain: empty provider output, unparseable JSON, or
//! a shape-invalid record degrades that stage to its rule-based fallback
//! without touching the others. The pipeline as a whole is infallible; the
//! worst case is a response assembled entirely from fallback rules plus a
//! canned reply.

use std::sync::Arc;

use careline_core::domain::{
    ChatRequest, ChatResponse, EmotionRiskAnalysis, IntentAnalysis, StrategyDecision,
};
use careline_core::errors::ShapeError;
use careline_core::extract::extract_json;
use careline_core::fallback;
use careline_core::prompts::{render, PromptLibrary};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dispatcher::{Dispatcher, ANALYSIS_TEMPERATURE, REPLY_TEMPERATURE};
use crate::llm::LlmClient;

/// Why a stage abandoned its model-derived result. Consumed locally by the
/// degrade branch; never propagated past the stage boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
enum StageDegrade {
    #[error("provider returned empty output")]
    EmptyOutput,
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

pub struct ChatPipeline {
    dispatcher: Dispatcher,
    prompts: PromptLibrary,
}

impl ChatPipeline {
    pub fn new(client: Arc<dyn LlmClient>, prompts: PromptLibrary) -> Self {
        Self { dispatcher: Dispatcher::new(client), prompts }
    }

    pub fn prompts(&self) -> &PromptLibrary {
        &self.prompts
    }

    pub fn provider_name(&self) -> &'static str {
        self.dispatcher.provider_name()
    }

    /// Run one message through all four stages. Always returns a fully
    /// populated response with non-empty content.
    pub async fn process(&self, request: &ChatRequest) -> ChatResponse {
        let correlation_id = Uuid::new_v4().to_string();
        info!(
            event_name = "pipeline.request.start",
            correlation_id = %correlation_id,
            provider = self.dispatcher.provider_name(),
            "processing chat request"
        );

        let intent = match self.try_intent(&request.message).await {
            Ok(intent) => intent,
            Err(reason) => {
                warn!(
                    event_name = "pipeline.stage.intent_degraded",
                    correlation_id = %correlation_id,
                    reason = %reason,
                    "intent stage degraded to fallback rules"
                );
                fallback::intent_for(&request.message)
            }
        };

        // Stage context is the raw message only; intent does not feed in.
        let emotion = match self.try_emotion(&request.message).await {
            Ok(emotion) => emotion,
            Err(reason) => {
                warn!(
                    event_name = "pipeline.stage.emotion_degraded",
                    correlation_id = %correlation_id,
                    reason = %reason,
                    "emotion stage degraded to fallback rules"
                );
                fallback::emotion_for(&request.message)
            }
        };

        // Fallback composition uses whatever upstream records are already
        // finalized, model-derived or not.
        let strategy = match self.try_strategy(&intent, &emotion).await {
            Ok(strategy) => strategy,
            Err(reason) => {
                warn!(
                    event_name = "pipeline.stage.strategy_degraded",
                    correlation_id = %correlation_id,
                    reason = %reason,
                    "strategy stage degraded to fallback rules"
                );
                fallback::strategy_for(&intent, &emotion)
            }
        };

        let content = self.reply(request, &intent, &emotion, &strategy, &correlation_id).await;

        info!(
            event_name = "pipeline.request.complete",
            correlation_id = %correlation_id,
            intent = %intent.intent,
            strategy = %strategy.strategy,
            "chat request completed"
        );

        ChatResponse {
            content,
            intent_analysis: intent,
            emotion_analysis: emotion,
            strategy_decision: strategy,
            suggested_actions: Vec::new(),
        }
    }

    async fn try_intent(&self, message: &str) -> Result<IntentAnalysis, StageDegrade> {
        let user_prompt = json_only_prompt(message);
        let text = self
            .dispatcher
            .generate(&self.prompts.intent_detection, &user_prompt, ANALYSIS_TEMPERATURE)
            .await;
        if text.trim().is_empty() {
            return Err(StageDegrade::EmptyOutput);
        }
        Ok(IntentAnalysis::from_mapping(extract_json(&text))?)
    }

    async fn try_emotion(&self, message: &str) -> Result<EmotionRiskAnalysis, StageDegrade> {
        let user_prompt = json_only_prompt(message);
        let text = self
            .dispatcher
            .generate(&self.prompts.emotion_risk, &user_prompt, ANALYSIS_TEMPERATURE)
            .await;
        if text.trim().is_empty() {
            return Err(StageDegrade::EmptyOutput);
        }
        Ok(EmotionRiskAnalysis::from_mapping(extract_json(&text))?)
    }

    async fn try_strategy(
        &self,
        intent: &IntentAnalysis,
        emotion: &EmotionRiskAnalysis,
    ) -> Result<StrategyDecision, StageDegrade> {
        let context = format!(
            "Intent: {}, Emotion Level: {}, Risk Tags: {}",
            intent.intent,
            emotion.emotion_level,
            emotion.risk_tags.join(", ")
        );
        let user_prompt = format!("{context}\nRespond with JSON only.");
        let text = self
            .dispatcher
            .generate(&self.prompts.strategy_routing, &user_prompt, ANALYSIS_TEMPERATURE)
            .await;
        if text.trim().is_empty() {
            return Err(StageDegrade::EmptyOutput);
        }
        Ok(StrategyDecision::from_mapping(extract_json(&text))?)
    }

    /// Response stage returns prose directly, with no JSON parsing. Only an
    /// empty reply triggers the canned strategy-keyed fallback.
    async fn reply(
        &self,
        request: &ChatRequest,
        intent: &IntentAnalysis,
        emotion: &EmotionRiskAnalysis,
        strategy: &StrategyDecision,
        correlation_id: &str,
    ) -> String {
        let emotion_level = emotion.emotion_level.to_string();
        let history = request.render_history();
        let user_prompt = render(
            &self.prompts.response_generation,
            &[
                ("strategy", strategy.strategy.as_str()),
                ("intent", intent.intent.as_str()),
                ("emotion_level", emotion_level.as_str()),
                ("history", history.as_str()),
                ("message", request.message.as_str()),
            ],
        );

        let reply = self
            .dispatcher
            .generate(&self.prompts.system_role, &user_prompt, REPLY_TEMPERATURE)
            .await;

        if reply.trim().is_empty() {
            warn!(
                event_name = "pipeline.stage.response_degraded",
                correlation_id = %correlation_id,
                strategy = %strategy.strategy,
                "response stage degraded to canned reply"
            );
            return fallback::reply_for(strategy);
        }

        reply
    }
}

fn json_only_prompt(message: &str) -> String {
    format!("User message: {message}\nRespond with JSON only.")
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use super::*;

    /// Replays a fixed sequence of completions, one per stage call, and
    /// records every prompt it receives. Exhausted scripts return empty
    /// output so trailing stages degrade.
    struct ScriptedClient {
        script: Mutex<VecDeque<Result<String>>>,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<String>>) -> Self {
            Self { script: Mutex::new(script.into()), calls: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> Vec<(String, String, String)> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(
            &self,
            system_prompt: &str,
            user_prompt: &str,
            temperature: f32,
        ) -> Result<String> {
            self.calls.lock().expect("calls lock").push((
                system_prompt.to_string(),
                user_prompt.to_string(),
                format!("{temperature:.1}"),
            ));
            self.script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    struct UnavailableClient;

    #[async_trait]
    impl LlmClient for UnavailableClient {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _temperature: f32,
        ) -> Result<String> {
            Err(anyhow!("backend unavailable"))
        }

        fn name(&self) -> &'static str {
            "unavailable"
        }
    }

    fn prompt_fixture() -> PromptLibrary {
        PromptLibrary {
            system_role: "You are a customer support agent.".to_string(),
            intent_detection: "Classify the intent.".to_string(),
            emotion_risk: "Score emotion and risk.".to_string(),
            strategy_routing: "Pick a strategy.".to_string(),
            response_generation:
                "Strategy: {{strategy}}\nIntent: {{intent}}\nLevel: {{emotion_level}}\nHistory: {{history}}\nCustomer: {{message}}"
                    .to_string(),
        }
    }

    fn pipeline_with(client: Arc<dyn LlmClient>) -> ChatPipeline {
        ChatPipeline::new(client, prompt_fixture())
    }

    #[tokio::test]
    async fn total_provider_outage_still_yields_a_full_response() {
        let pipeline = pipeline_with(Arc::new(UnavailableClient));
        let response = pipeline.process(&ChatRequest::new("I want a refund, now!")).await;

        assert!(!response.content.is_empty());
        assert_eq!(response.intent_analysis.intent, fallback::INTENT_AFTER_SALES);
        assert_eq!(response.strategy_decision.strategy, fallback::STRATEGY_AFTER_SALES);
        assert_eq!(
            response.content,
            fallback::reply_for(&response.strategy_decision),
            "reply must be the canned after-sales string"
        );
        assert!(response.suggested_actions.is_empty());
    }

    #[tokio::test]
    async fn outage_emotion_scoring_matches_the_rule_table() {
        let pipeline = pipeline_with(Arc::new(UnavailableClient));
        let response =
            pipeline.process(&ChatRequest::new("Awful service! I will file a complaint.")).await;

        assert_eq!(response.emotion_analysis.emotion_level, 2);
        assert_eq!(response.emotion_analysis.risk_score, 50);
        assert!(response
            .emotion_analysis
            .risk_tags
            .contains(&"platform_complaint".to_string()));
    }

    #[tokio::test]
    async fn fenced_intent_json_succeeds_without_fallback() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(
            "```json\n{\"intent\":\"X\",\"confidence\":0.8,\"reasoning\":\"r\"}\n```".to_string(),
        )]));
        let pipeline = pipeline_with(client);
        let response = pipeline.process(&ChatRequest::new("hello")).await;

        assert_eq!(response.intent_analysis.intent, "X");
        assert!((response.intent_analysis.confidence - 0.8).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn one_degraded_stage_does_not_disturb_the_others() {
        // Intent returns brace-free garbage; emotion and strategy return
        // valid records; the reply comes back as prose.
        let client = Arc::new(ScriptedClient::new(vec![
            Ok("no json here at all".to_string()),
            Ok(r#"{"emotion_level": 1, "risk_tags": ["platform_complaint"], "risk_score": 30}"#
                .to_string()),
            Ok(r#"{"strategy": "deescalate", "prompt_template_name": "deescalate", "reasoning": "model"}"#
                .to_string()),
            Ok("Thanks for your patience — let me sort this out.".to_string()),
        ]));
        let pipeline = pipeline_with(client);
        let response = pipeline.process(&ChatRequest::new("plain message")).await;

        // Intent fell back; everything else kept its model-derived result.
        assert_eq!(response.intent_analysis.intent, fallback::INTENT_PRODUCT_INQUIRY);
        assert_eq!(response.emotion_analysis.emotion_level, 1);
        assert_eq!(response.emotion_analysis.risk_score, 30);
        assert_eq!(response.strategy_decision.strategy, "deescalate");
        assert_eq!(response.content, "Thanks for your patience — let me sort this out.");
    }

    #[tokio::test]
    async fn shape_invalid_emotion_falls_back_while_strategy_sees_the_fallback_record() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(r#"{"intent": "after_sales", "confidence": 0.95, "reasoning": "model"}"#
                .to_string()),
            // Valid JSON, invalid shape: level outside the closed domain.
            Ok(r#"{"emotion_level": 9, "risk_tags": [], "risk_score": 10}"#.to_string()),
            // Strategy stage output empty: composes fallback from the
            // model intent and the fallback emotion.
            Ok(String::new()),
            Ok(String::new()),
        ]));
        let pipeline = pipeline_with(client);
        let response = pipeline.process(&ChatRequest::new("calm message")).await;

        assert_eq!(response.intent_analysis.intent, "after_sales");
        assert_eq!(response.emotion_analysis.emotion_level, 0);
        assert_eq!(response.strategy_decision.strategy, fallback::STRATEGY_AFTER_SALES);
        assert_eq!(response.content, fallback::reply_for(&response.strategy_decision));
    }

    #[tokio::test]
    async fn all_four_stages_are_called_with_expected_prompts_and_temperatures() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(r#"{"intent": "logistics", "confidence": 0.9, "reasoning": "model"}"#.to_string()),
            Ok(r#"{"emotion_level": 0, "risk_tags": [], "risk_score": 0}"#.to_string()),
            Ok(r#"{"strategy": "warm_guidance", "prompt_template_name": "guide", "reasoning": "model"}"#
                .to_string()),
            Ok("Here is your tracking info.".to_string()),
        ]));
        let pipeline = pipeline_with(Arc::clone(&client) as Arc<dyn LlmClient>);
        let mut request = ChatRequest::new("where is my delivery?");
        request.history.push(careline_core::domain::HistoryTurn {
            role: "user".to_string(),
            content: "ordered last week".to_string(),
        });

        let response = pipeline.process(&request).await;
        assert_eq!(response.content, "Here is your tracking info.");

        let calls = client.calls();
        assert_eq!(calls.len(), 4);

        assert_eq!(calls[0].0, "Classify the intent.");
        assert!(calls[0].1.contains("where is my delivery?"));
        assert!(calls[0].1.contains("Respond with JSON only."));
        assert_eq!(calls[0].2, "0.1");

        assert_eq!(calls[1].0, "Score emotion and risk.");
        assert_eq!(calls[1].2, "0.1");

        assert_eq!(calls[2].0, "Pick a strategy.");
        assert!(calls[2].1.contains("Intent: logistics"));
        assert!(calls[2].1.contains("Emotion Level: 0"));
        assert_eq!(calls[2].2, "0.1");

        assert_eq!(calls[3].0, "You are a customer support agent.");
        assert!(calls[3].1.contains("Strategy: warm_guidance"));
        assert!(calls[3].1.contains("Intent: logistics"));
        assert!(calls[3].1.contains("Customer: where is my delivery?"));
        assert!(calls[3].1.contains("ordered last week"));
        assert_eq!(calls[3].2, "0.7");
    }

    #[tokio::test]
    async fn content_is_never_empty_even_with_empty_prompt_templates() {
        let pipeline = ChatPipeline::new(Arc::new(UnavailableClient), PromptLibrary::default());
        let response = pipeline.process(&ChatRequest::new("anything")).await;
        assert!(!response.content.is_empty());
    }
}
