use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Required variables fail startup; tunables fall back to defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Base URL of the external AI evaluation service.
    pub ai_service_url: String,
    /// Shared secret used both for outbound calls and inbound webhook auth.
    pub ai_service_api_key: String,
    /// Total attempts per evaluation job (first call included).
    pub retry_attempts: u32,
    /// Delay before each retry of a failed evaluation call.
    pub retry_delay: Duration,
    /// Outbound request timeout. Evaluation is compute-heavy on the remote
    /// side, so this is generous by default.
    pub request_timeout: Duration,
    /// Number of evaluation worker tasks.
    pub workers: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            ai_service_url: std::env::var("AI_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            ai_service_api_key: require_env("AI_SERVICE_API_KEY")?,
            retry_attempts: env_or("AI_RETRY_ATTEMPTS", 3)?,
            retry_delay: Duration::from_secs(env_or("AI_RETRY_DELAY_SECS", 5)?),
            request_timeout: Duration::from_secs(env_or("AI_REQUEST_TIMEOUT_SECS", 30)?),
            workers: env_or("EVALUATION_WORKERS", 4)?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid value")),
        Err(_) => Ok(default),
    }
}
