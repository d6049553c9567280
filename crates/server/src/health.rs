use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::bootstrap::Application;

#[derive(Clone)]
pub struct HealthState {
    provider: &'static str,
    model: String,
    missing_templates: Vec<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub provider: HealthCheck,
    pub prompts: HealthCheck,
    pub checked_at: String,
}

pub fn router(app: &Application) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState {
        provider: app.pipeline.provider_name(),
        model: app.config.llm.model.clone(),
        missing_templates: app.pipeline.prompts().missing(),
    })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let service = HealthCheck { status: "ok", detail: "accepting requests".to_string() };
    let provider = HealthCheck {
        status: "ok",
        detail: format!("provider `{}` with model `{}`", state.provider, state.model),
    };
    let prompts = if state.missing_templates.is_empty() {
        HealthCheck { status: "ok", detail: "all prompt templates loaded".to_string() }
    } else {
        HealthCheck {
            status: "degraded",
            detail: format!("missing templates: {}", state.missing_templates.join(", ")),
        }
    };

    // Missing templates degrade response quality but never availability,
    // so the endpoint stays 200 either way.
    let status = if prompts.status == "ok" { "ok" } else { "degraded" };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status,
            service,
            provider,
            prompts,
            checked_at: Utc::now().to_rfc3339(),
        }),
    )
}
