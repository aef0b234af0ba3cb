//! Best-effort UI notification when an evaluation completes.
//!
//! Injected as a capability so the core never depends on a real push
//! channel. Callers must treat failures as non-fatal: a broken notifier
//! never fails an evaluation.

use async_trait::async_trait;
use tracing::info;

use crate::errors::AppError;
use crate::models::person::PersonRef;
use crate::models::swarm_decision::SwarmDecision;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn evaluation_complete(
        &self,
        person: PersonRef,
        decision: &SwarmDecision,
    ) -> Result<(), AppError>;
}

/// Logs to the person's evaluation stream key. Stand-in until a real-time
/// push channel is wired up.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn evaluation_complete(
        &self,
        person: PersonRef,
        decision: &SwarmDecision,
    ) -> Result<(), AppError> {
        info!(
            stream = %person.stream_key(),
            decision_id = decision.id,
            confidence = ?decision.overall_confidence,
            agents = decision.agent_count(),
            bias_concerns = decision.has_bias_concerns(),
            "evaluation complete"
        );
        Ok(())
    }
}

/// Does nothing. Default for tests and headless deployments.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn evaluation_complete(
        &self,
        _person: PersonRef,
        _decision: &SwarmDecision,
    ) -> Result<(), AppError> {
        Ok(())
    }
}
