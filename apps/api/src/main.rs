mod ai_client;
mod config;
mod db;
mod directory;
mod errors;
mod jobs;
mod ledger;
mod models;
mod notify;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ai_client::AiClient;
use crate::config::Config;
use crate::db::create_pool;
use crate::directory::PgDirectory;
use crate::jobs::{JobContext, RetryPolicy};
use crate::ledger::PgLedger;
use crate::notify::LogNotifier;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Honeybee API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;

    // Initialize AI service client
    let ai = AiClient::new(
        config.ai_service_url.clone(),
        config.ai_service_api_key.clone(),
        config.request_timeout,
    );
    info!("AI service client initialized ({})", config.ai_service_url);

    let directory = Arc::new(PgDirectory::new(pool.clone()));
    let ledger = Arc::new(PgLedger::new(pool));
    let notifier = Arc::new(LogNotifier);

    // Start the evaluation worker pool
    let jobs = jobs::start(
        JobContext {
            evaluator: Arc::new(ai.clone()),
            directory: directory.clone(),
            ledger: ledger.clone(),
            notifier: notifier.clone(),
            retry: RetryPolicy {
                attempts: config.retry_attempts,
                delay: config.retry_delay,
            },
        },
        config.workers,
    );

    // Build app state
    let state = AppState {
        ai,
        directory,
        ledger,
        notifier,
        jobs,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
