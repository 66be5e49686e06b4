use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{error, info, warn};

use pr_reviewer::event::ChangeEvent;
use pr_reviewer::review::handle_event;

use crate::core::app_state::AppState;
use crate::routes::webhook::webhook_response::WebhookResponse;
use crate::signature::verify_signature;

/// POST /webhook
///
/// GitHub webhook intake. Verifies the body signature, drops redelivered
/// delivery ids, decodes the payload into a typed event and spawns the
/// review pipeline. Responds immediately; classification and processing
/// results are visible only in logs and in the posted review.
pub async fn webhook_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<WebhookResponse>) {
    let delivery = header_str(&headers, "X-GitHub-Delivery").unwrap_or("unknown");
    let Some(event_type) = header_str(&headers, "X-GitHub-Event") else {
        warn!(delivery, "webhook without event type header");
        return (
            StatusCode::BAD_REQUEST,
            Json(WebhookResponse::rejected("missing X-GitHub-Event header")),
        );
    };
    info!(event_type, delivery, "webhook received");

    // Authenticity first: nothing of the body is interpreted before the
    // signature over the raw bytes checks out.
    let verified = header_str(&headers, "X-Hub-Signature-256")
        .map(|sig| verify_signature(&state.webhook_secret, &body, sig))
        .unwrap_or(false);
    if !verified {
        warn!(delivery, "webhook signature missing or invalid");
        return (
            StatusCode::FORBIDDEN,
            Json(WebhookResponse::rejected("invalid signature")),
        );
    }

    if delivery != "unknown" {
        let fresh = state.deliveries.lock().await.check_and_insert(delivery);
        if !fresh {
            info!(delivery, "duplicate delivery, skipping");
            return (
                StatusCode::OK,
                Json(WebhookResponse::skipped("duplicate delivery")),
            );
        }
    }

    let event = match ChangeEvent::decode(event_type, &body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            info!(event_type, delivery, "event type not handled");
            return (
                StatusCode::OK,
                Json(WebhookResponse::skipped(format!(
                    "ignored event type: {event_type}"
                ))),
            );
        }
        Err(e) => {
            warn!(event_type, delivery, error = %e, "payload did not decode");
            return (
                StatusCode::OK,
                Json(WebhookResponse::skipped("undecodable payload")),
            );
        }
    };

    // Acknowledge now; classify and review in the background.
    let state = state.clone();
    let delivery = delivery.to_string();
    tokio::spawn(async move {
        match handle_event(&state.config, &state.github, &state.llm, &event).await {
            Ok(outcome) => info!(delivery, %outcome, "review run finished"),
            Err(e) => error!(delivery, error = %e, "review run failed"),
        }
    });

    (StatusCode::OK, Json(WebhookResponse::accepted()))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
