use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ShapeError;

/// Stage-1 result: what the customer is trying to accomplish.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub intent: String,
    pub confidence: f64,
    pub reasoning: String,
}

/// Stage-2 result. `emotion_level` is a closed 0..=3 scale
/// (0=calm, 1=annoyed, 2=angry, 3=hostile). `risk_score` is advisory and is
/// not cross-validated against the level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionRiskAnalysis {
    pub emotion_level: u8,
    pub risk_tags: Vec<String>,
    pub risk_score: u8,
}

/// Stage-3 result. `prompt_template_name` is not checked for existence; a
/// missing template degrades to an empty prompt downstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDecision {
    pub strategy: String,
    pub prompt_template_name: String,
    pub reasoning: String,
}

fn from_mapping<T: for<'de> Deserialize<'de>>(mapping: Map<String, Value>) -> Result<T, ShapeError> {
    if mapping.is_empty() {
        return Err(ShapeError::EmptyMapping);
    }
    serde_json::from_value(Value::Object(mapping))
        .map_err(|source| ShapeError::Deserialize(source.to_string()))
}

impl IntentAnalysis {
    /// Shape-validate a parsed model mapping into a record. The pipeline
    /// branches to fallback on `Err`; nothing here panics or propagates.
    pub fn from_mapping(mapping: Map<String, Value>) -> Result<Self, ShapeError> {
        from_mapping(mapping)
    }
}

impl EmotionRiskAnalysis {
    pub fn from_mapping(mapping: Map<String, Value>) -> Result<Self, ShapeError> {
        let record: Self = from_mapping(mapping)?;
        if record.emotion_level > 3 {
            return Err(ShapeError::OutOfRange {
                field: "emotion_level",
                value: i64::from(record.emotion_level),
                expected: "0..=3",
            });
        }
        if record.risk_score > 100 {
            return Err(ShapeError::OutOfRange {
                field: "risk_score",
                value: i64::from(record.risk_score),
                expected: "0..=100",
            });
        }
        Ok(record)
    }
}

impl StrategyDecision {
    pub fn from_mapping(mapping: Map<String, Value>) -> Result<Self, ShapeError> {
        from_mapping(mapping)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn mapping(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object fixture, got {other}"),
        }
    }

    #[test]
    fn intent_accepts_well_formed_mapping() {
        let record = IntentAnalysis::from_mapping(mapping(json!({
            "intent": "after_sales",
            "confidence": 0.8,
            "reasoning": "customer asked for a refund"
        })))
        .expect("shape should validate");

        assert_eq!(record.intent, "after_sales");
        assert!((record.confidence - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn intent_rejects_empty_mapping() {
        assert_eq!(
            IntentAnalysis::from_mapping(Map::new()),
            Err(ShapeError::EmptyMapping)
        );
    }

    #[test]
    fn intent_rejects_missing_fields() {
        let result = IntentAnalysis::from_mapping(mapping(json!({"intent": "after_sales"})));
        assert!(matches!(result, Err(ShapeError::Deserialize(_))));
    }

    #[test]
    fn emotion_rejects_level_outside_closed_domain() {
        let result = EmotionRiskAnalysis::from_mapping(mapping(json!({
            "emotion_level": 4,
            "risk_tags": [],
            "risk_score": 10
        })));
        assert_eq!(
            result,
            Err(ShapeError::OutOfRange { field: "emotion_level", value: 4, expected: "0..=3" })
        );
    }

    #[test]
    fn emotion_rejects_risk_score_above_100() {
        let result = EmotionRiskAnalysis::from_mapping(mapping(json!({
            "emotion_level": 1,
            "risk_tags": ["platform_complaint"],
            "risk_score": 250
        })));
        assert!(matches!(result, Err(ShapeError::OutOfRange { field: "risk_score", .. })));
    }

    #[test]
    fn emotion_rejects_mistyped_level() {
        let result = EmotionRiskAnalysis::from_mapping(mapping(json!({
            "emotion_level": "angry",
            "risk_tags": [],
            "risk_score": 0
        })));
        assert!(matches!(result, Err(ShapeError::Deserialize(_))));
    }

    #[test]
    fn strategy_accepts_well_formed_mapping() {
        let record = StrategyDecision::from_mapping(mapping(json!({
            "strategy": "deescalate",
            "prompt_template_name": "deescalate",
            "reasoning": "elevated emotion"
        })))
        .expect("shape should validate");
        assert_eq!(record.prompt_template_name, "deescalate");
    }
}
