pub mod ai;
pub mod candidates;
pub mod health;
pub mod webhooks;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Evaluation trigger + ledger reads
        .route(
            "/api/v1/candidates/:id/evaluate",
            post(candidates::request_evaluation),
        )
        .route(
            "/api/v1/candidates/:id/decisions",
            get(candidates::list_decisions),
        )
        // AI service diagnostics
        .route("/api/v1/ai/status", get(ai::agent_status))
        .route("/api/v1/ai/health", get(ai::health))
        // Inbound callback from the AI service
        .route("/api/webhooks/swarm_decision", post(webhooks::swarm_decision))
        .with_state(state)
}
