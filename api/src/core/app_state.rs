//! Shared state for all HTTP handlers.

use std::env;

use tokio::sync::Mutex;

use pr_reviewer::config::ReviewerConfig;
use pr_reviewer::github::GithubClient;
use pr_reviewer::llm::LlmClient;

use crate::core::delivery_log::DeliveryLog;
use crate::error_handler::AppError;

/// How many recent webhook delivery ids are remembered for dedup.
const DELIVERY_LOG_CAPACITY: usize = 1024;

/// Shared state for all HTTP handlers.
pub struct AppState {
    /// Bind address, e.g. "0.0.0.0:8080".
    pub listen_addr: String,
    /// Shared secret GitHub signs webhook bodies with.
    pub webhook_secret: String,
    /// Pipeline configuration handed to every review run.
    pub config: ReviewerConfig,
    /// GitHub REST client, cloned into background tasks.
    pub github: GithubClient,
    /// Model client, cloned into background tasks.
    pub llm: LlmClient,
    /// Recently seen delivery ids (redelivery dedup).
    pub deliveries: Mutex<DeliveryLog>,
}

impl AppState {
    /// Load shared state from environment variables and construct the
    /// collaborator clients once.
    pub fn from_env() -> Result<Self, AppError> {
        let config = ReviewerConfig::from_env()?;
        let webhook_secret = env::var("GITHUB_WEBHOOK_SECRET")
            .map_err(|_| AppError::MissingEnv("GITHUB_WEBHOOK_SECRET"))?;

        let github = GithubClient::new(&config.github, config.retry.clone())?;
        let llm = LlmClient::new(config.llm.clone(), config.retry.clone())?;

        Ok(Self {
            listen_addr: env::var("API_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            webhook_secret,
            config,
            github,
            llm,
            deliveries: Mutex::new(DeliveryLog::new(DELIVERY_LOG_CAPACITY)),
        })
    }
}
