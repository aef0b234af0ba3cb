//! HTTP client for the external AI evaluation service.
//!
//! ARCHITECTURAL RULE: no other module may talk to the AI service directly.
//! All evaluation requests, agent-status queries, and health probes go
//! through [`AiClient`]. Retry policy belongs to the caller (the evaluation
//! job), not the client: a failed call surfaces as [`AiServiceError`] and the
//! caller decides whether to try again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AiServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid JSON response from AI service: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Profile references handed to the swarm for one candidate.
/// Every reference is independently optional; `None` fields are omitted from
/// the outbound payload entirely (the service schema distinguishes absent
/// from explicit null).
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationInput {
    pub candidate_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_opening_id: Option<i64>,
}

/// Parsed swarm consensus for one evaluation call. Vote and consensus
/// payloads stay opaque; the service's internal schema is not ours to model.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationResult {
    pub agent_votes: Option<Value>,
    pub consensus_details: Option<Value>,
    pub overall_confidence: Option<f64>,
    pub bias_flags: Option<Vec<String>>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

/// Seam between the orchestration layer and the real HTTP client, so job
/// logic can be exercised against stub evaluators.
#[async_trait]
pub trait CandidateEvaluator: Send + Sync {
    async fn evaluate(&self, input: &EvaluationInput) -> Result<EvaluationResult, AiServiceError>;
}

/// The single client used for all AI service calls.
#[derive(Clone)]
pub struct AiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AiClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            api_key,
        }
    }

    /// GET /api/v1/agents/status — per-agent health, arbitrary JSON payload.
    pub async fn agent_status(&self) -> Result<Value, AiServiceError> {
        let response = self
            .client
            .get(format!("{}/api/v1/agents/status", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        parse_response(response).await
    }

    /// GET /api/v1/health — best-effort liveness probe.
    /// Any transport or status failure is swallowed into `false`.
    pub async fn healthy(&self) -> bool {
        let response = self
            .client
            .get(format!("{}/api/v1/health", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await;

        match response {
            Ok(r) => r.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl CandidateEvaluator for AiClient {
    /// POST /api/v1/evaluate — asks the swarm for a consensus on one
    /// candidate. Blocks up to the configured timeout; evaluation is
    /// compute-heavy on the remote side.
    async fn evaluate(&self, input: &EvaluationInput) -> Result<EvaluationResult, AiServiceError> {
        let response = self
            .client
            .post(format!("{}/api/v1/evaluate", self.base_url))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(input)
            .send()
            .await?;

        let result: EvaluationResult = parse_response(response).await?;

        debug!(
            candidate_id = input.candidate_id,
            confidence = ?result.overall_confidence,
            "AI evaluation call succeeded"
        );

        Ok(result)
    }
}

/// Shared response handling: non-success statuses carry the raw body so the
/// caller can log it; success bodies must parse as the expected shape — a
/// partially-parsed result is never returned.
async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AiServiceError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(AiServiceError::Api {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(AiServiceError::Parse)
}

#[cfg(test)]
pub mod testing {
    //! Scripted evaluator for exercising the orchestration layer.

    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Fails the first `failures` calls with a 503-style error, then returns
    /// a fixed result. Counts every call.
    pub struct ScriptedEvaluator {
        pub failures: u32,
        pub result: EvaluationResult,
        pub calls: AtomicU32,
    }

    impl ScriptedEvaluator {
        pub fn new(failures: u32, result: EvaluationResult) -> Self {
            Self {
                failures,
                result,
                calls: AtomicU32::new(0),
            }
        }

        pub fn succeeding(result: EvaluationResult) -> Self {
            Self::new(0, result)
        }

        pub fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CandidateEvaluator for ScriptedEvaluator {
        async fn evaluate(
            &self,
            _input: &EvaluationInput,
        ) -> Result<EvaluationResult, AiServiceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(AiServiceError::Api {
                    status: 503,
                    body: "swarm unavailable".to_string(),
                });
            }
            Ok(self.result.clone())
        }
    }

    pub fn sample_result() -> EvaluationResult {
        EvaluationResult {
            agent_votes: Some(serde_json::json!({"a": "approve", "b": "reject"})),
            consensus_details: Some(serde_json::json!({"method": "weighted"})),
            overall_confidence: Some(0.73),
            bias_flags: Some(vec![]),
            evaluated_at: Some(Utc::now()),
        }
    }
}
