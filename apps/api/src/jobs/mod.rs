//! Background evaluation jobs.
//!
//! Evaluation requests are fire-and-forget from the trigger's point of view:
//! the HTTP handler enqueues an [`EvaluationJob`] and returns immediately. A
//! fixed pool of worker tasks drains the queue; jobs for different candidates
//! run fully in parallel, and nothing de-bounces two jobs for the same
//! candidate (the AI service is safe to call twice). Outcomes surface only
//! through logs — permanent failures are discarded with a warning, exhausted
//! retries are errors for the monitoring layer to alert on.

pub mod evaluation;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use crate::ai_client::CandidateEvaluator;
use crate::directory::Directory;
use crate::errors::AppError;
use crate::ledger::DecisionLedger;
use crate::notify::Notifier;

pub use evaluation::{EvaluationJob, JobError};

const QUEUE_DEPTH: usize = 256;

/// Retry policy for transient AI service failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, first call included.
    pub attempts: u32,
    /// Scheduled delay before each retry. No lock is held across it.
    pub delay: Duration,
}

/// Everything a worker needs to run one job. All collaborators sit behind
/// trait objects so job logic is testable without Postgres or the service.
#[derive(Clone)]
pub struct JobContext {
    pub evaluator: Arc<dyn CandidateEvaluator>,
    pub directory: Arc<dyn Directory>,
    pub ledger: Arc<dyn DecisionLedger>,
    pub notifier: Arc<dyn Notifier>,
    pub retry: RetryPolicy,
}

/// Cloneable dispatch handle onto the evaluation queue.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<EvaluationJob>,
}

impl JobQueue {
    pub async fn dispatch(&self, job: EvaluationJob) -> Result<(), AppError> {
        self.tx
            .send(job)
            .await
            .map_err(|_| AppError::Internal(anyhow::anyhow!("evaluation queue is closed")))
    }
}

/// Spawns the worker pool and returns the dispatch handle.
pub fn start(ctx: JobContext, workers: usize) -> JobQueue {
    let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
    let rx = Arc::new(Mutex::new(rx));

    for worker in 0..workers {
        tokio::spawn(worker_loop(worker, ctx.clone(), rx.clone()));
    }
    info!(workers, "evaluation worker pool started");

    JobQueue { tx }
}

async fn worker_loop(
    worker: usize,
    ctx: JobContext,
    rx: Arc<Mutex<mpsc::Receiver<EvaluationJob>>>,
) {
    loop {
        // Receiver lock is released before the job runs, so other workers
        // keep draining the queue while this one is busy.
        let job = { rx.lock().await.recv().await };
        let Some(job) = job else {
            break;
        };

        match evaluation::run(&ctx, &job).await {
            Ok(decision) => info!(
                worker,
                candidate_id = job.candidate_id,
                decision_id = decision.id,
                "evaluation job complete"
            ),
            Err(e) if e.is_permanent() => warn!(
                worker,
                candidate_id = job.candidate_id,
                error = %e,
                "evaluation job discarded"
            ),
            Err(e) => error!(
                worker,
                candidate_id = job.candidate_id,
                error = %e,
                "evaluation job failed"
            ),
        }
    }
}
