//! Reviewer configuration.
//!
//! All knobs live in one explicit [`ReviewerConfig`] value constructed at
//! the composition root (normally [`ReviewerConfig::from_env`] in the api
//! crate) and passed by reference into the pipeline. Components never read
//! the process environment themselves.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::retry::RetryConfig;

/// GitHub REST endpoint and credentials.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// API base, e.g. "https://api.github.com".
    pub base_api: String,
    /// Access token (PAT or app installation token).
    pub token: String,
}

/// Generative model endpoint and credentials.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API base, e.g. "https://generativelanguage.googleapis.com".
    pub endpoint: String,
    /// Provider API key.
    pub api_key: String,
    /// Model name, e.g. "gemini-1.5-pro-latest".
    pub model: String,
}

/// Size and concurrency limits applied by the orchestrator.
#[derive(Debug, Clone)]
pub struct ReviewLimits {
    /// At most this many files are sent to the model per review run.
    pub max_files_per_review: usize,
    /// Total character budget across all assembled prompts in one run.
    pub max_prompt_len: usize,
    /// Upper bound on concurrent model calls inside one run.
    pub max_concurrency: usize,
}

impl Default for ReviewLimits {
    fn default() -> Self {
        Self {
            max_files_per_review: 50,
            max_prompt_len: 200_000,
            max_concurrency: 4,
        }
    }
}

/// Complete configuration for one reviewer instance.
#[derive(Debug, Clone)]
pub struct ReviewerConfig {
    pub github: GithubConfig,
    pub llm: LlmConfig,
    pub limits: ReviewLimits,
    pub retry: RetryConfig,
    /// Mention token that addresses the bot in PR comments.
    pub bot_mention: String,
}

impl ReviewerConfig {
    /// Load configuration from environment variables.
    ///
    /// `GITHUB_TOKEN` and `GEMINI_API_KEY` are required; everything else
    /// falls back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let github = GithubConfig {
            base_api: env::var("GITHUB_API_BASE")
                .unwrap_or_else(|_| "https://api.github.com".into()),
            token: env::var("GITHUB_TOKEN").map_err(|_| ConfigError::MissingVar("GITHUB_TOKEN"))?,
        };

        let llm = LlmConfig {
            endpoint: env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into()),
            api_key: env::var("GEMINI_API_KEY")
                .map_err(|_| ConfigError::MissingVar("GEMINI_API_KEY"))?,
            model: env::var("AI_MODEL_NAME").unwrap_or_else(|_| "gemini-1.5-pro-latest".into()),
        };

        let limits = ReviewLimits {
            max_files_per_review: parse_var("MAX_FILES_PER_REVIEW", 50)?,
            max_prompt_len: parse_var("MAX_PROMPT_LENGTH", 200_000)?,
            max_concurrency: parse_var("REVIEW_CONCURRENCY", 4)?,
        };

        let retry = RetryConfig {
            max_attempts: parse_var("MAX_RETRY_ATTEMPTS", 3)?,
            initial_delay: Duration::from_secs_f64(parse_var("RETRY_DELAY", 2.0)?),
            ..RetryConfig::default()
        };

        Ok(Self {
            github,
            llm,
            limits,
            retry,
            bot_mention: env::var("BOT_MENTION").unwrap_or_else(|_| "@pr-review-bot".into()),
        })
    }
}

/// Parse an optional numeric env var, falling back to `default` when unset.
fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var, value: raw }),
        Err(_) => Ok(default),
    }
}
