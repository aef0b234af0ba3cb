//! One evaluation job, start to finish.
//!
//! Per-invocation lifecycle (task-local, nothing persisted):
//! resolve the candidate and optional job opening, call the AI service with
//! bounded retries, append one ledger entry, fire the best-effort completion
//! push. A candidate or job opening that does not resolve is a permanent
//! failure — it will never resolve on retry, so the job is discarded.
//! Service errors are transient: the call is retried up to the configured
//! attempt count with a scheduled delay in between, and only after the last
//! attempt does the job fail.

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::ai_client::{AiServiceError, EvaluationInput, EvaluationResult};
use crate::errors::AppError;
use crate::models::person::PersonRef;
use crate::models::swarm_decision::{NewSwarmDecision, SwarmDecision};

use super::JobContext;

/// Decision tag written by the job path.
const JOB_DECISION_TYPE: &str = "initial_screen";

#[derive(Debug, Clone, Copy)]
pub struct EvaluationJob {
    pub candidate_id: i64,
    pub job_opening_id: Option<i64>,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Candidate {0} not found")]
    CandidateNotFound(i64),

    #[error("Job opening {0} not found")]
    JobOpeningNotFound(i64),

    #[error("AI evaluation failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: AiServiceError,
    },

    #[error(transparent)]
    App(#[from] AppError),
}

impl JobError {
    /// Permanent failures are discarded without retry; everything else is a
    /// failed task for the scheduling layer.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            JobError::CandidateNotFound(_) | JobError::JobOpeningNotFound(_)
        )
    }
}

pub async fn run(ctx: &JobContext, job: &EvaluationJob) -> Result<SwarmDecision, JobError> {
    let candidate = ctx
        .directory
        .find_candidate(job.candidate_id)
        .await?
        .ok_or(JobError::CandidateNotFound(job.candidate_id))?;

    let job_opening_id = match job.job_opening_id {
        Some(id) => {
            // Scoped to the candidate's own company.
            ctx.directory
                .find_job_opening(candidate.company_id, id)
                .await?
                .ok_or(JobError::JobOpeningNotFound(id))?;
            Some(id)
        }
        None => None,
    };

    info!(candidate_id = candidate.id, "Requesting AI evaluation");

    let input = EvaluationInput {
        candidate_id: candidate.id,
        resume_url: candidate.resume_url(),
        linkedin_url: candidate.linkedin_url.clone(),
        github_url: candidate.github_url.clone(),
        job_opening_id,
    };

    let result = call_with_retries(ctx, &input).await?;

    // Stored immediately even though the service may also deliver the same
    // result via webhook later; the ledger keeps both entries.
    let decision = ctx
        .ledger
        .append(NewSwarmDecision {
            candidate_id: candidate.id,
            job_opening_id,
            decision_type: JOB_DECISION_TYPE.to_string(),
            agent_votes: result.agent_votes.unwrap_or_else(|| json!({})),
            consensus_details: result.consensus_details.unwrap_or_else(|| json!({})),
            overall_confidence: result.overall_confidence,
            bias_flags: result.bias_flags.unwrap_or_default(),
            evaluated_at: result.evaluated_at.unwrap_or_else(Utc::now),
        })
        .await?;

    info!(
        candidate_id = candidate.id,
        confidence = ?decision.overall_confidence,
        "AI evaluation complete"
    );

    if let Err(e) = ctx
        .notifier
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

async fn call_with_retries(
    ctx: &JobContext,
    input: &EvaluationInput,
) -> Result<EvaluationResult, JobError> {
    let mut attempt = 1u32;
    loop {
        match ctx.evaluator.evaluate(input).await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < ctx.retry.attempts => {
                warn!(
                    candidate_id = input.candidate_id,
                    attempt,
                    error = %e,
                    "AI evaluation attempt failed, retrying after delay"
                );
                tokio::time::sleep(ctx.retry.delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(JobError::Exhausted {
                    attempts: attempt,
                    source: e,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::ai_client::testing::{sample_result, ScriptedEvaluator};
    use crate::directory::testing::StubDirectory;
    use crate::directory::Directory;
    use crate::jobs::RetryPolicy;
    use crate::ledger::testing::MemoryLedger;
    use crate::notify::testing::{CountingNotifier, FailingNotifier};
    use crate::notify::Notifier;

    struct Harness {
        evaluator: Arc<ScriptedEvaluator>,
        ledger: Arc<MemoryLedger>,
        notifier: Arc<CountingNotifier>,
        ctx: JobContext,
    }

    fn harness(directory: StubDirectory, evaluator: ScriptedEvaluator) -> Harness {
        let evaluator = Arc::new(evaluator);
        let ledger = Arc::new(MemoryLedger::new());
        let notifier = Arc::new(CountingNotifier::default());
        let ctx = JobContext {
            evaluator: evaluator.clone(),
            directory: Arc::new(directory),
            ledger: ledger.clone(),
            notifier: notifier.clone(),
            retry: RetryPolicy {
                attempts: 3,
                delay: Duration::from_secs(5),
            },
        };
        Harness {
            evaluator,
            ledger,
            notifier,
            ctx,
        }
    }

    fn job(candidate_id: i64) -> EvaluationJob {
        EvaluationJob {
            candidate_id,
            job_opening_id: None,
        }
    }

    #[tokio::test]
    async fn success_writes_one_initial_screen_entry() {
        let h = harness(
            StubDirectory::with_candidate(42, 1),
            ScriptedEvaluator::succeeding(sample_result()),
        );

        let decision = run(&h.ctx, &job(42)).await.unwrap();

        assert_eq!(decision.decision_type, "initial_screen");
        assert_eq!(decision.overall_confidence, Some(0.73));
        assert_eq!(decision.agent_count(), 2);
        assert!(!decision.has_bias_concerns());
        assert_eq!(h.ledger.entries().len(), 1);
        assert_eq!(h.notifier.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_retry_then_succeed() {
        let h = harness(
            StubDirectory::with_candidate(42, 1),
            ScriptedEvaluator::new(2, sample_result()),
        );

        run(&h.ctx, &job(42)).await.unwrap();

        assert_eq!(h.evaluator.call_count(), 3);
        assert_eq!(h.ledger.entries().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_fail_without_ledger_write() {
        let h = harness(
            StubDirectory::with_candidate(42, 1),
            ScriptedEvaluator::new(3, sample_result()),
        );

        let err = run(&h.ctx, &job(42)).await.unwrap_err();

        assert!(matches!(err, JobError::Exhausted { attempts: 3, .. }));
        assert!(!err.is_permanent());
        assert_eq!(h.evaluator.call_count(), 3);
        assert!(h.ledger.entries().is_empty());
        assert_eq!(h.notifier.count(), 0);
    }

    #[tokio::test]
    async fn missing_candidate_discards_before_any_call() {
        let h = harness(
            StubDirectory::default(),
            ScriptedEvaluator::succeeding(sample_result()),
        );

        let err = run(&h.ctx, &job(42)).await.unwrap_err();

        assert!(matches!(err, JobError::CandidateNotFound(42)));
        assert!(err.is_permanent());
        assert_eq!(h.evaluator.call_count(), 0);
        assert!(h.ledger.entries().is_empty());
    }

    #[tokio::test]
    async fn job_opening_is_scoped_to_the_candidates_company() {
        // Opening 9 belongs to company 2, candidate to company 1.
        let h = harness(
            StubDirectory::with_candidate(42, 1).and_job_opening(9, 2),
            ScriptedEvaluator::succeeding(sample_result()),
        );

        let err = run(
            &h.ctx,
            &EvaluationJob {
                candidate_id: 42,
                job_opening_id: Some(9),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, JobError::JobOpeningNotFound(9)));
        assert!(err.is_permanent());
        assert_eq!(h.evaluator.call_count(), 0);
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_the_job() {
        let directory: Arc<dyn Directory> = Arc::new(StubDirectory::with_candidate(42, 1));
        let ledger = Arc::new(MemoryLedger::new());
        let notifier: Arc<dyn Notifier> = Arc::new(FailingNotifier);
        let ctx = JobContext {
            evaluator: Arc::new(ScriptedEvaluator::succeeding(sample_result())),
            directory,
            ledger: ledger.clone(),
            notifier,
            retry: RetryPolicy {
                attempts: 3,
                delay: Duration::from_secs(5),
            },
        };

        run(&ctx, &job(42)).await.unwrap();
        assert_eq!(ledger.entries().len(), 1);
    }

    #[tokio::test]
    async fn absent_result_fields_default_at_ingestion() {
        let sparse = crate::ai_client::EvaluationResult {
            agent_votes: None,
            consensus_details: None,
            overall_confidence: None,
            bias_flags: None,
            evaluated_at: None,
        };
        let h = harness(
            StubDirectory::with_candidate(42, 1),
            ScriptedEvaluator::succeeding(sparse),
        );

        let decision = run(&h.ctx, &job(42)).await.unwrap();

        assert_eq!(decision.agent_count(), 0);
        assert!(!decision.has_bias_concerns());
        assert_eq!(decision.overall_confidence, None);
    }
}
