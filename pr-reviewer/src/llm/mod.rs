//! Thin client for the Gemini text-generation endpoint.
//!
//! Single non-streaming call: POST
//! `{endpoint}/v1beta/models/{model}:generateContent` with the prompt as
//! one user turn. The model is instructed (by the prompt assembler) to
//! answer with [`NO_ISSUES_SENTINEL`] when it has nothing to say; the
//! orchestrator turns that sentinel into "no finding".

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;
use crate::errors::{LlmError, RrResult};
use crate::retry::{RetryConfig, retry_with_backoff};

/// Canonical model output meaning "record no finding for this file".
pub const NO_ISSUES_SENTINEL: &str = "No issues found.";

/// Thin Gemini client reused across review runs.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    cfg: LlmConfig,
    retry: RetryConfig,
}

impl LlmClient {
    /// Build a client from config. Fails only if the HTTP stack cannot
    /// be constructed.
    pub fn new(cfg: LlmConfig, retry: RetryConfig) -> RrResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent("pr-reviewer/0.1")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(LlmError::from)?;
        Ok(Self { http, cfg, retry })
    }

    /// Generate review text for one assembled prompt.
    pub async fn generate(&self, prompt: &str) -> RrResult<String> {
        retry_with_backoff(&self.retry, || self.generate_once(prompt)).await
    }

    async fn generate_once(&self, prompt: &str) -> RrResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.cfg.endpoint.trim_end_matches('/'),
            self.cfg.model
        );
        let req = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.cfg.api_key)
            .json(&req)
            .send()
            .await
            .map_err(LlmError::from)?
            .error_for_status()
            .map_err(LlmError::from)?;

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .map(|c| c.text())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse.into());
        }
        debug!(chars = text.len(), "model response received");
        Ok(text)
    }
}

// --- Gemini request/response shapes (subset of fields we actually use) ---

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

impl Candidate {
    /// Concatenated text of all parts in this candidate.
    fn text(self) -> String {
        self.content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}
