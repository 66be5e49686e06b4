//! HTTP surface of the review bot.
//!
//! Two routes:
//! - `GET /health`   — liveness probe.
//! - `POST /webhook` — GitHub webhook intake: signature check, delivery
//!   dedup, typed decode, then hand-off to the pipeline in a background
//!   task. The caller gets an immediate acknowledgment.

use std::sync::Arc;

mod core;
mod error_handler;
mod routes;
mod signature;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::info;

use crate::core::app_state::AppState;
use crate::routes::{health::health_route::health_route, webhook::webhook_route::webhook_route};

pub use crate::error_handler::AppError;

/// Build state from the environment and serve until ctrl-c.
pub async fn start() -> Result<(), AppError> {
    let state = Arc::new(AppState::from_env()?);

    let app = Router::new()
        .route("/health", get(health_route))
        .route("/webhook", post(webhook_route))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(&state.listen_addr)
        .await
        .map_err(AppError::Bind)?;
    info!(addr = %state.listen_addr, "webhook endpoint listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Returns a future that resolves when ctrl-c is pressed.
async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
}
