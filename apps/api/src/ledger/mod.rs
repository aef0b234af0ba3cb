//! Append-only store for swarm decisions.
//!
//! Both write paths — the evaluation job and the webhook receiver — converge
//! here, and nowhere else. Every write is a pure insert, so concurrent
//! writers never contend; the two paths are not ordered relative to each
//! other and duplicates across them are allowed. Readers wanting "the latest
//! decision" must order by `evaluated_at`, not assume a single source.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::swarm_decision::{
    NewSwarmDecision, SwarmDecision, HIGH_CONFIDENCE_THRESHOLD,
};

#[async_trait]
pub trait DecisionLedger: Send + Sync {
    /// Validates and appends one entry. Never updates.
    async fn append(&self, new: NewSwarmDecision) -> Result<SwarmDecision, AppError>;

    /// All entries for a candidate, newest evaluation first.
    async fn recent(&self, candidate_id: i64) -> Result<Vec<SwarmDecision>, AppError>;

    /// Entries with `overall_confidence >= 0.8`.
    async fn high_confidence(&self, candidate_id: i64) -> Result<Vec<SwarmDecision>, AppError>;

    /// Entries that raised at least one bias flag.
    async fn with_bias_flags(&self, candidate_id: i64) -> Result<Vec<SwarmDecision>, AppError>;
}

const COLUMNS: &str = "id, candidate_id, job_opening_id, decision_type, agent_votes, \
     consensus_details, overall_confidence::float8 AS overall_confidence, bias_flags, \
     evaluated_at, created_at, updated_at";

pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DecisionLedger for PgLedger {
    async fn append(&self, new: NewSwarmDecision) -> Result<SwarmDecision, AppError> {
        new.validate()?;

        let decision = sqlx::query_as::<_, SwarmDecision>(&format!(
            r#"
            INSERT INTO swarm_decisions
                (candidate_id, job_opening_id, decision_type, agent_votes,
                 consensus_details, overall_confidence, bias_flags, evaluated_at,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now(), now())
            RETURNING {COLUMNS}
            "#
        ))
        .bind(new.candidate_id)
        .bind(new.job_opening_id)
        .bind(&new.decision_type)
        .bind(Json(&new.agent_votes))
        .bind(Json(&new.consensus_details))
        .bind(new.overall_confidence)
        .bind(Json(&new.bias_flags))
        .bind(new.evaluated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(decision)
    }

    async fn recent(&self, candidate_id: i64) -> Result<Vec<SwarmDecision>, AppError> {
        let decisions = sqlx::query_as::<_, SwarmDecision>(&format!(
            "SELECT {COLUMNS} FROM swarm_decisions \
             WHERE candidate_id = $1 ORDER BY evaluated_at DESC"
        ))
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(decisions)
    }

    async fn high_confidence(&self, candidate_id: i64) -> Result<Vec<SwarmDecision>, AppError> {
        let decisions = sqlx::query_as::<_, SwarmDecision>(&format!(
            "SELECT {COLUMNS} FROM swarm_decisions \
             WHERE candidate_id = $1 AND overall_confidence >= $2 \
             ORDER BY evaluated_at DESC"
        ))
        .bind(candidate_id)
        .bind(HIGH_CONFIDENCE_THRESHOLD)
        .fetch_all(&self.pool)
        .await?;

        Ok(decisions)
    }

    async fn with_bias_flags(&self, candidate_id: i64) -> Result<Vec<SwarmDecision>, AppError> {
        let decisions = sqlx::query_as::<_, SwarmDecision>(&format!(
            "SELECT {COLUMNS} FROM swarm_decisions \
             WHERE candidate_id = $1 AND jsonb_array_length(bias_flags) > 0 \
             ORDER BY evaluated_at DESC"
        ))
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(decisions)
    }
}
