//! Deterministic rule-based substitutes for every pipeline stage.
//!
//! These functions are the safety net behind the LLM path: pure, total, and
//! keyword-driven, so the pipeline always produces a schema-conformant
//! result even with zero provider availability. The triage is intentionally
//! simple: a handful of substring checks, not a classifier.

use crate::domain::{EmotionRiskAnalysis, IntentAnalysis, StrategyDecision};

pub const INTENT_AFTER_SALES: &str = "after_sales";
pub const INTENT_LOGISTICS: &str = "logistics";
pub const INTENT_COMPLAINT: &str = "complaint";
pub const INTENT_PRODUCT_INQUIRY: &str = "product_inquiry";

pub const STRATEGY_AFTER_SALES: &str = "standard_after_sales";
pub const STRATEGY_DEESCALATE: &str = "deescalate";
pub const STRATEGY_WARM_GUIDANCE: &str = "warm_guidance";

const AFTER_SALES_KEYWORDS: &[&str] = &["return", "refund", "exchange"];
const LOGISTICS_KEYWORDS: &[&str] = &["shipping", "delivery", "track", "courier"];
const COMPLAINT_KEYWORDS: &[&str] = &["complaint", "complain"];
const HOSTILITY_KEYWORDS: &[&str] = &["angry", "furious", "garbage", "trash"];
const ESCALATION_KEYWORDS: &[&str] = &["complaint", "complain", "report"];

const RISK_TAG_PLATFORM_COMPLAINT: &str = "platform_complaint";

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| haystack.contains(keyword))
}

pub fn intent_for(message: &str) -> IntentAnalysis {
    let normalized = message.to_lowercase();

    if contains_any(&normalized, AFTER_SALES_KEYWORDS) {
        return IntentAnalysis {
            intent: INTENT_AFTER_SALES.to_string(),
            confidence: 0.9,
            reasoning: "return or refund keyword detected".to_string(),
        };
    }
    if contains_any(&normalized, LOGISTICS_KEYWORDS) {
        return IntentAnalysis {
            intent: INTENT_LOGISTICS.to_string(),
            confidence: 0.9,
            reasoning: "logistics keyword detected".to_string(),
        };
    }
    if contains_any(&normalized, COMPLAINT_KEYWORDS) {
        return IntentAnalysis {
            intent: INTENT_COMPLAINT.to_string(),
            confidence: 0.9,
            reasoning: "complaint keyword detected".to_string(),
        };
    }

    IntentAnalysis {
        intent: INTENT_PRODUCT_INQUIRY.to_string(),
        confidence: 0.6,
        reasoning: "default intent".to_string(),
    }
}

pub fn emotion_for(message: &str) -> EmotionRiskAnalysis {
    let normalized = message.to_lowercase();

    let emotion_level =
        if message.contains('!') || contains_any(&normalized, HOSTILITY_KEYWORDS) { 2 } else { 0 };

    let mut risk_tags = Vec::new();
    if contains_any(&normalized, ESCALATION_KEYWORDS) {
        risk_tags.push(RISK_TAG_PLATFORM_COMPLAINT.to_string());
    }

    EmotionRiskAnalysis { emotion_level, risk_tags, risk_score: emotion_level * 25 }
}

/// Decision table keyed on the finalized intent label. The upstream records
/// may themselves be LLM-derived or fallback-derived; the table does not
/// care which.
pub fn strategy_for(intent: &IntentAnalysis, _emotion: &EmotionRiskAnalysis) -> StrategyDecision {
    match intent.intent.as_str() {
        INTENT_AFTER_SALES => StrategyDecision {
            strategy: STRATEGY_AFTER_SALES.to_string(),
            prompt_template_name: "after_sales".to_string(),
            reasoning: "after-sales flow".to_string(),
        },
        INTENT_COMPLAINT => StrategyDecision {
            strategy: STRATEGY_DEESCALATE.to_string(),
            prompt_template_name: "deescalate".to_string(),
            reasoning: "complaint de-escalation".to_string(),
        },
        _ => StrategyDecision {
            strategy: STRATEGY_WARM_GUIDANCE.to_string(),
            prompt_template_name: "guide".to_string(),
            reasoning: "default guidance".to_string(),
        },
    }
}

/// Canned reply keyed on the strategy label. Guarantees non-empty content.
pub fn reply_for(strategy: &StrategyDecision) -> String {
    match strategy.strategy.as_str() {
        STRATEGY_AFTER_SALES => {
            "We're sorry this didn't work out. Returns and exchanges are accepted within 7 days \
             — you can start one from your order page, and return shipping is covered."
        }
        STRATEGY_DEESCALATE => {
            "We hear you, and we're sorry for the trouble. A support specialist is reviewing \
             your case now and will follow up shortly."
        }
        _ => {
            "Hi there! I'm your dedicated support assistant. Ask me anything about our products \
             and I'll be glad to help."
        }
    }
    .to_string()
}
