//! Chat API routes.
//!
//! Endpoints:
//! - `POST /api/chat`    — run one message through the analysis pipeline
//! - `GET  /api/prompts` — loaded prompt templates, for operator inspection
//!
//! The chat handler is infallible by construction: every expected
//! degradation (provider outage, bad JSON, bad shape) is absorbed inside
//! the pipeline and arrives here as a valid fallback-derived response. A
//! 5xx from this surface would indicate a pipeline invariant violation.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use careline_agent::ChatPipeline;
use careline_core::domain::{ChatRequest, ChatResponse};
use serde::Serialize;

#[derive(Clone)]
pub struct ApiState {
    pipeline: Arc<ChatPipeline>,
}

pub fn router(pipeline: Arc<ChatPipeline>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/prompts", get(prompts))
        .with_state(ApiState { pipeline })
}

async fn chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    Json(state.pipeline.process(&request).await)
}

#[derive(Clone, Debug, Serialize)]
struct PromptsResponse {
    system_role: String,
    intent_detection: String,
    emotion_risk: String,
    strategy_routing: String,
    response_generation: String,
}

async fn prompts(State(state): State<ApiState>) -> Json<PromptsResponse> {
    let library = state.pipeline.prompts();
    Json(PromptsResponse {
        system_role: library.system_role.clone(),
        intent_detection: library.intent_detection.clone(),
        emotion_risk: library.emotion_risk.clone(),
        strategy_routing: library.strategy_routing.clone(),
        response_generation: library.response_generation.clone(),
    })
}
