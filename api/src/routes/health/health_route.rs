use axum::Json;
use serde::Serialize;

/// Response body for the liveness probe.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health_route() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive",
        service: "pr-ai-backend",
        version: env!("CARGO_PKG_VERSION"),
    })
}
