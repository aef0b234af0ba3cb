use std::sync::Arc;

use crate::ai_client::AiClient;
use crate::config::Config;
use crate::directory::Directory;
use crate::jobs::JobQueue;
use crate::ledger::DecisionLedger;
use crate::notify::Notifier;

/// Shared application state injected into all route handlers via Axum
/// extractors. Storage access and the push channel sit behind trait objects
/// so handlers stay decoupled from Postgres and the UI transport.
#[derive(Clone)]
pub struct AppState {
    pub ai: AiClient,
    pub directory: Arc<dyn Directory>,
    pub ledger: Arc<dyn DecisionLedger>,
    pub notifier: Arc<dyn Notifier>,
    pub jobs: JobQueue,
    pub config: Config,
}
