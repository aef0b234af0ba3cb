//! Evaluation trigger and decision-ledger reads for a candidate.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::jobs::EvaluationJob;
use crate::models::person::PersonRef;
use crate::models::swarm_decision::SwarmDecision;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    /// Tenant the caller is acting in; scopes the existence check.
    pub company_id: i64,
    pub job_opening_id: Option<i64>,
}

/// POST /api/v1/candidates/:id/evaluate
/// Enqueues a background evaluation and returns immediately. The result
/// arrives in the ledger, not in this response.
pub async fn request_evaluation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<EvaluateRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let person = PersonRef::Candidate(id);
    if !state.directory.person_exists(req.company_id, person).await? {
        return Err(AppError::NotFound(format!("Candidate {id} not found")));
    }

    state
        .jobs
        .dispatch(EvaluationJob {
            candidate_id: id,
            job_opening_id: req.job_opening_id,
        })
        .await?;

    info!(candidate_id = id, "evaluation queued");
    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "queued" }))))
}

#[derive(Debug, Deserialize)]
pub struct DecisionsQuery {
    pub filter: Option<String>,
}

/// GET /api/v1/candidates/:id/decisions?filter=high_confidence|bias_flagged
/// Ledger entries for a candidate, newest evaluation first. The ledger is
/// eventually consistent across the job and webhook write paths.
pub async fn list_decisions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<DecisionsQuery>,
) -> Result<Json<Vec<SwarmDecision>>, AppError> {
    let decisions = match query.filter.as_deref() {
        None => state.ledger.recent(id).await?,
        Some("high_confidence") => state.ledger.high_confidence(id).await?,
        Some("bias_flagged") => state.ledger.with_bias_flags(id).await?,
        Some(other) => {
            return Err(AppError::Validation(format!("Unknown filter '{other}'")));
        }
    };

    Ok(Json(decisions))
}
