//! Inbound callback from the AI service.
//!
//! The service delivers evaluation results out-of-band here, independent of
//! whether the job path already stored a result for the same candidate. The
//! token check runs before any other processing; delivery is at-least-once
//! on the service side and the receiver does no deduplication, so a re-sent
//! event becomes a second ledger entry.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::directory::Directory;
use crate::errors::AppError;
use crate::ledger::DecisionLedger;
use crate::models::person::PersonRef;
use crate::models::swarm_decision::{NewSwarmDecision, SwarmDecision};
use crate::notify::Notifier;
use crate::state::AppState;

/// Decision tag when the service doesn't supply one.
const WEBHOOK_DECISION_TYPE: &str = "webhook";

#[derive(Debug, Deserialize)]
pub struct SwarmDecisionPayload {
    pub candidate_id: i64,
    pub job_opening_id: Option<i64>,
    pub decision_type: Option<String>,
    pub agent_votes: Option<Value>,
    pub consensus_details: Option<Value>,
    pub overall_confidence: Option<f64>,
    pub bias_flags: Option<Vec<String>>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub decision_id: i64,
}

/// POST /api/webhooks/swarm_decision
///
/// Takes the raw body so the token check runs before anything is parsed; a
/// bad token gets 401 no matter what the body contains.
pub async fn swarm_decision(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<WebhookResponse>), AppError> {
    verify_bearer(&headers, &state.config.ai_service_api_key)?;

    let payload: SwarmDecisionPayload = serde_json::from_str(&body)
        .map_err(|e| AppError::UnprocessableEntity(format!("Invalid payload: {e}")))?;

    let decision = receive(
        state.directory.as_ref(),
        state.ledger.as_ref(),
        state.notifier.as_ref(),
        payload,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(WebhookResponse {
            status: "ok",
            decision_id: decision.id,
        }),
    ))
}

/// Resolves the referenced entities and appends one ledger entry.
/// The contract exposes only 401/404/422: anything that isn't auth or a
/// missing reference surfaces as a generic processing failure.
pub async fn receive(
    directory: &dyn Directory,
    ledger: &dyn DecisionLedger,
    notifier: &dyn Notifier,
    payload: SwarmDecisionPayload,
) -> Result<SwarmDecision, AppError> {
    info!(
        candidate_id = payload.candidate_id,
        "Received swarm decision webhook"
    );

    let candidate = directory
        .find_candidate(payload.candidate_id)
        .await
        .map_err(as_processing_failure)?
        .ok_or_else(|| {
            AppError::NotFound(format!("Candidate {} not found", payload.candidate_id))
        })?;

    let job_opening_id = match payload.job_opening_id {
        Some(id) => {
            // Scoped to the candidate's own company.
            directory
                .find_job_opening(candidate.company_id, id)
                .await
                .map_err(as_processing_failure)?
                .ok_or_else(|| AppError::NotFound(format!("Job opening {id} not found")))?;
            Some(id)
        }
        None => None,
    };

    let decision = ledger
        .append(NewSwarmDecision {
            candidate_id: candidate.id,
            job_opening_id,
            decision_type: payload
                .decision_type
                .unwrap_or_else(|| WEBHOOK_DECISION_TYPE.to_string()),
            agent_votes: payload.agent_votes.unwrap_or_else(|| json!({})),
            consensus_details: payload.consensus_details.unwrap_or_else(|| json!({})),
            overall_confidence: payload.overall_confidence,
            bias_flags: payload.bias_flags.unwrap_or_default(),
            evaluated_at: payload.evaluated_at.unwrap_or_else(Utc::now),
        })
        .await
        .map_err(as_processing_failure)?;

    if let Err(e) = notifier
        .evaluation_complete(PersonRef::Candidate(candidate.id), &decision)
        .await
    {
        warn!(
            candidate_id = candidate.id,
            error = %e,
            "evaluation-complete notification failed"
        );
    }

    Ok(decision)
}

/// Rejects unless the bearer token matches the shared secret. Runs before
/// any body processing so a bad token never causes side effects.
fn verify_bearer(headers: &HeaderMap, expected: &str) -> Result<(), AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or("");

    if constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Constant-time comparison (no early exit on mismatched bytes).
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

fn as_processing_failure(e: AppError) -> AppError {
    match e {
        AppError::NotFound(_) | AppError::Unauthorized => e,
        other => AppError::UnprocessableEntity(other.to_string()),
    }
}
