use serde::Serialize;

/// Response body returned by the webhook route.
///
/// The contract with the sender is an acknowledgment, not a result:
/// accepted events are processed in the background and any later failure
/// surfaces only through logs and side effects.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WebhookResponse {
    pub fn accepted() -> Self {
        Self {
            status: "accepted",
            reason: None,
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: "skipped",
            reason: Some(reason.into()),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            status: "rejected",
            reason: Some(reason.into()),
        }
    }
}
