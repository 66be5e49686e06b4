//! Per-repository review policy.
//!
//! Repositories opt into scoping and prompt overrides by committing a
//! `.pr-review-bot.yml` at their root. The file is read at the head
//! commit of the change under review, so policy changes ride along with
//! the PR that introduces them. Absence, fetch failures and malformed
//! content all fall back to the defaults — policy loading is never fatal.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::github::GithubClient;

/// Well-known path of the policy file inside the target repository.
pub const POLICY_FILE_PATH: &str = ".pr-review-bot.yml";

/// Review policy for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoPolicy {
    /// Path prefixes never reviewed. Checked before `include_paths`.
    pub exclude_paths: Vec<String>,
    /// If non-empty, only paths starting with one of these are reviewed.
    pub include_paths: Vec<String>,
    /// Language the model is asked to answer in.
    pub review_language: String,
    /// Optional prompt template with `{filename}`, `{file_diff}` and
    /// `{output_language}` placeholders.
    pub custom_prompt: Option<String>,
}

impl Default for RepoPolicy {
    fn default() -> Self {
        Self {
            exclude_paths: Vec::new(),
            include_paths: Vec::new(),
            review_language: "english".into(),
            custom_prompt: None,
        }
    }
}

/// Parse policy file content, defaulting on any schema or syntax error.
pub fn parse_policy(text: &str) -> RepoPolicy {
    match serde_yml::from_str::<RepoPolicy>(text) {
        Ok(policy) => policy,
        Err(e) => {
            warn!(error = %e, "malformed policy file, using defaults");
            RepoPolicy::default()
        }
    }
}

/// Fetch and parse the repository policy at the given commit.
pub async fn resolve(github: &GithubClient, repo: &str, commit: &str) -> RepoPolicy {
    match github.get_file_content(repo, POLICY_FILE_PATH, commit).await {
        Ok(Some(text)) => parse_policy(&text),
        Ok(None) => {
            debug!(repo, "no policy file at head commit, using defaults");
            RepoPolicy::default()
        }
        Err(e) => {
            warn!(repo, error = %e, "policy file fetch failed, using defaults");
            RepoPolicy::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_document_parses_into_all_fields() {
        let text = "\
exclude_paths:
  - vendor/
  - generated/
include_paths:
  - src/
review_language: german
custom_prompt: \"Review {filename}: {file_diff} in {output_language}\"
";
        let policy = parse_policy(text);
        assert_eq!(policy.exclude_paths, vec!["vendor/", "generated/"]);
        assert_eq!(policy.include_paths, vec!["src/"]);
        assert_eq!(policy.review_language, "german");
        assert!(policy.custom_prompt.is_some());
    }

    #[test]
    fn missing_keys_take_defaults() {
        let policy = parse_policy("review_language: french\n");
        assert_eq!(policy.review_language, "french");
        assert!(policy.exclude_paths.is_empty());
        assert!(policy.include_paths.is_empty());
        assert!(policy.custom_prompt.is_none());
    }

    #[test]
    fn malformed_content_yields_the_default_policy() {
        assert_eq!(parse_policy(":::: not yaml ["), RepoPolicy::default());
        assert_eq!(parse_policy("exclude_paths: 12"), RepoPolicy::default());
    }

    #[test]
    fn empty_content_yields_the_default_policy() {
        assert_eq!(parse_policy(""), RepoPolicy::default());
    }
}
