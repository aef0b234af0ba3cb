//! The AI evaluation audit trail.
//!
//! A `SwarmDecision` records one consensus produced by the agent swarm for
//! one candidate, optionally relative to a job opening. Rows are immutable
//! after creation: corrections and re-evaluations append new rows, they never
//! update existing ones. Vote and consensus payloads are kept as opaque JSON
//! because the swarm's internal schema evolves independently of this app.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;

use crate::errors::AppError;

/// Entries at or above this confidence count as high-confidence.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SwarmDecision {
    pub id: i64,
    pub candidate_id: i64,
    pub job_opening_id: Option<i64>,
    /// Classification tag, e.g. "initial_screen" (job path) or "webhook".
    pub decision_type: String,
    /// Per-agent vote payload, opaque. Empty object when the swarm sent none.
    pub agent_votes: Json<Value>,
    /// How the votes were reconciled, opaque.
    pub consensus_details: Json<Value>,
    pub overall_confidence: Option<f64>,
    pub bias_flags: Json<Vec<String>>,
    /// When the swarm produced the result (evaluator-supplied, falls back to
    /// ingestion time).
    pub evaluated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SwarmDecision {
    pub fn has_bias_concerns(&self) -> bool {
        !self.bias_flags.0.is_empty()
    }

    /// Number of distinct agents that voted.
    pub fn agent_count(&self) -> usize {
        self.agent_votes.0.as_object().map_or(0, |votes| votes.len())
    }
}

/// Input for one ledger append. Both write paths (evaluation job and webhook)
/// funnel through this type so validation happens in one place.
#[derive(Debug, Clone)]
pub struct NewSwarmDecision {
    pub candidate_id: i64,
    pub job_opening_id: Option<i64>,
    pub decision_type: String,
    pub agent_votes: Value,
    pub consensus_details: Value,
    pub overall_confidence: Option<f64>,
    pub bias_flags: Vec<String>,
    pub evaluated_at: DateTime<Utc>,
}

impl NewSwarmDecision {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.decision_type.is_empty() {
            return Err(AppError::Validation(
                "decision_type must be present".to_string(),
            ));
        }
        if let Some(confidence) = self.overall_confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(AppError::Validation(format!(
                    "overall_confidence must be between 0 and 1, got {confidence}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> NewSwarmDecision {
        NewSwarmDecision {
            candidate_id: 42,
            job_opening_id: None,
            decision_type: "initial_screen".to_string(),
            agent_votes: json!({"resume": "approve"}),
            consensus_details: json!({}),
            overall_confidence: Some(0.73),
            bias_flags: vec![],
            evaluated_at: Utc::now(),
        }
    }

    #[test]
    fn accepts_confidence_within_unit_interval() {
        for confidence in [0.0, 0.5, 1.0] {
            let mut new = valid();
            new.overall_confidence = Some(confidence);
            assert!(new.validate().is_ok(), "rejected {confidence}");
        }
    }

    #[test]
    fn accepts_absent_confidence() {
        let mut new = valid();
        new.overall_confidence = None;
        assert!(new.validate().is_ok());
    }

    #[test]
    fn rejects_confidence_outside_unit_interval() {
        for confidence in [-0.1, 1.1, 42.0] {
            let mut new = valid();
            new.overall_confidence = Some(confidence);
            assert!(
                matches!(new.validate(), Err(AppError::Validation(_))),
                "accepted {confidence}"
            );
        }
    }

    #[test]
    fn rejects_empty_decision_type() {
        let mut new = valid();
        new.decision_type = String::new();
        assert!(matches!(new.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn agent_count_counts_distinct_voters() {
        let decision = SwarmDecision {
            id: 1,
            candidate_id: 42,
            job_opening_id: None,
            decision_type: "initial_screen".to_string(),
            agent_votes: Json(json!({"a": "approve", "b": "reject"})),
            consensus_details: Json(json!({})),
            overall_confidence: Some(0.73),
            bias_flags: Json(vec![]),
            evaluated_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(decision.agent_count(), 2);
        assert!(!decision.has_bias_concerns());
    }
}
