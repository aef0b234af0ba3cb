use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/v1/ai/status
/// Per-agent health as reported by the AI service, passed through verbatim.
pub async fn agent_status(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let status = state.ai.agent_status().await?;
    Ok(Json(status))
}

/// GET /api/v1/ai/health
/// Best-effort liveness of the AI service; never errors.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "healthy": state.ai.healthy().await }))
}
