//! GitHub REST client (API v3) for pull-request metadata, diffs, file
//! content and review submission.
//!
//! Endpoints used:
//! - GET  /repos/{owner}/{repo}/pulls/{number}            (metadata, head SHA)
//! - GET  /repos/{owner}/{repo}/pulls/{number}            (raw diff via the
//!   `application/vnd.github.v3.diff` media type)
//! - GET  /repos/{owner}/{repo}/contents/{path}?ref=...   (policy file)
//! - POST /repos/{owner}/{repo}/pulls/{number}/reviews    (batched review)
//!
//! Every call goes through the explicit retry policy handed in at
//! construction; transport retries live here, not in the orchestrator.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GithubConfig;
use crate::errors::{ProviderError, RrResult};
use crate::retry::{RetryConfig, retry_with_backoff};
use crate::review::ReviewFinding;

const ACCEPT_JSON: &str = "application/vnd.github.v3+json";
const ACCEPT_DIFF: &str = "application/vnd.github.v3.diff";

/// Thin GitHub client: shared reqwest instance, token, retry policy.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_api: String,
    token: String,
    retry: RetryConfig,
}

/// Pull-request metadata, reduced to what the pipeline reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub draft: bool,
    pub head: CommitRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

impl GithubClient {
    /// Build a client from config. Fails only if the HTTP stack cannot
    /// be constructed.
    pub fn new(cfg: &GithubConfig, retry: RetryConfig) -> RrResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent("pr-reviewer/0.1")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_api: cfg.base_api.trim_end_matches('/').to_string(),
            token: cfg.token.clone(),
            retry,
        })
    }

    /// Fetch pull-request metadata (current head SHA, draft flag).
    pub async fn get_pull_request(&self, repo: &str, number: u64) -> RrResult<PullRequest> {
        retry_with_backoff(&self.retry, || self.get_pull_request_once(repo, number)).await
    }

    async fn get_pull_request_once(&self, repo: &str, number: u64) -> RrResult<PullRequest> {
        let url = format!("{}/repos/{}/pulls/{}", self.base_api, repo, number);
        let pr: PullRequest = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", ACCEPT_JSON)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(pr)
    }

    /// Fetch the full unified diff of a pull request as raw text.
    pub async fn get_diff(&self, repo: &str, number: u64) -> RrResult<String> {
        retry_with_backoff(&self.retry, || self.get_diff_once(repo, number)).await
    }

    async fn get_diff_once(&self, repo: &str, number: u64) -> RrResult<String> {
        let url = format!("{}/repos/{}/pulls/{}", self.base_api, repo, number);
        let diff = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", ACCEPT_DIFF)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(repo, number, bytes = diff.len(), "fetched pull request diff");
        Ok(diff)
    }

    /// Fetch a file's content at a specific ref.
    ///
    /// Returns `Ok(None)` when the file does not exist at that ref.
    pub async fn get_file_content(
        &self,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> RrResult<Option<String>> {
        retry_with_backoff(&self.retry, || self.get_file_content_once(repo, path, git_ref)).await
    }

    async fn get_file_content_once(
        &self,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> RrResult<Option<String>> {
        let url = format!(
            "{}/repos/{}/contents/{}",
            self.base_api,
            repo,
            encode_path(path)
        );
        let resp = self
            .http
            .get(url)
            .query(&[("ref", git_ref)])
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", ACCEPT_JSON)
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: ContentsResponse = resp.error_for_status()?.json().await?;

        let Some(content) = body.content else {
            return Ok(None);
        };
        if body.encoding.as_deref() == Some("base64") {
            // GitHub wraps base64 content in newlines.
            let compact: String = content.split_whitespace().collect();
            let bytes = BASE64
                .decode(compact.as_bytes())
                .map_err(|e| ProviderError::InvalidResponse(format!("bad base64 content: {e}")))?;
            let text = String::from_utf8(bytes)
                .map_err(|e| ProviderError::InvalidResponse(format!("non-utf8 content: {e}")))?;
            return Ok(Some(text));
        }
        Ok(Some(content))
    }

    /// Submit one batched review carrying all inline findings.
    pub async fn post_review(
        &self,
        repo: &str,
        number: u64,
        commit_id: &str,
        findings: &[ReviewFinding],
    ) -> RrResult<()> {
        retry_with_backoff(&self.retry, || {
            self.post_review_once(repo, number, commit_id, findings)
        })
        .await
    }

    async fn post_review_once(
        &self,
        repo: &str,
        number: u64,
        commit_id: &str,
        findings: &[ReviewFinding],
    ) -> RrResult<()> {
        let url = format!("{}/repos/{}/pulls/{}/reviews", self.base_api, repo, number);
        let comments: Vec<ReviewCommentReq<'_>> = findings
            .iter()
            .map(|f| ReviewCommentReq {
                path: &f.path,
                position: f.position,
                body: &f.body,
            })
            .collect();
        let req = ReviewReq {
            commit_id,
            event: "COMMENT",
            comments,
        };

        self.http
            .post(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", ACCEPT_JSON)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        debug!(repo, number, comments = findings.len(), "review submitted");
        Ok(())
    }
}

/// Percent-encode a repo-relative path, segment by segment.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// --- GitHub request/response shapes (subset of fields we actually use) ---

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReviewReq<'a> {
    commit_id: &'a str,
    event: &'static str,
    comments: Vec<ReviewCommentReq<'a>>,
}

#[derive(Debug, Serialize)]
struct ReviewCommentReq<'a> {
    path: &'a str,
    position: u32,
    body: &'a str,
}
