//! Review orchestrator: the single entry point that turns an accepted
//! webhook event into a posted review.
//!
//! 1) **Classify** — decide whether the event triggers a run at all.
//! 2) **Resolve** — current head SHA (comment commands look it up) and
//!    the repository policy at that commit.
//! 3) **Plan** — fetch the diff, parse it, filter by policy, precompute
//!    comment positions and assemble prompts within the size limits.
//!    This stage is pure given the diff text.
//! 4) **Generate** — fan out one model call per planned file, bounded by
//!    a semaphore. A failed call is logged and costs that file its
//!    finding, nothing more.
//! 5) **Submit** — sort findings by (path, position) and post them as
//!    one batched review; zero findings means no submission.
//!
//! Diff retrieval and review submission failures abort the run with an
//! error; everything else degrades per file.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::{ReviewLimits, ReviewerConfig};
use crate::errors::RrResult;
use crate::event::{ChangeEvent, Decision, ReviewTrigger, classify};
use crate::github::GithubClient;
use crate::llm::{LlmClient, NO_ISSUES_SENTINEL};
use crate::policy::{self, RepoPolicy};
use crate::{map, parser, prompt};

/// One inline comment ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFinding {
    /// Post-change file path.
    pub path: String,
    /// 1-based diff position inside the anchoring hunk.
    pub position: u32,
    /// Markdown body.
    pub body: String,
}

/// Terminal state of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Nothing to do: rejected event, empty diff, or no reviewable files.
    Skipped { reason: String },
    /// The pipeline ran to completion. `findings_posted` is zero when
    /// every file came back clean — a no-op distinguishable from a skip.
    Completed {
        files_reviewed: usize,
        findings_posted: usize,
    },
}

impl std::fmt::Display for ReviewOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped { reason } => write!(f, "skipped ({reason})"),
            Self::Completed {
                files_reviewed,
                findings_posted,
            } => write!(
                f,
                "completed ({files_reviewed} files reviewed, {findings_posted} findings posted)"
            ),
        }
    }
}

/// A planned model call for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub path: String,
    pub position: u32,
    pub prompt: String,
}

/// Result of the pure planning stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewPlan {
    Skip { reason: &'static str },
    Review { tasks: Vec<FileTask> },
}

/// Classify an event and, if accepted, run the review pipeline.
pub async fn handle_event(
    cfg: &ReviewerConfig,
    github: &GithubClient,
    llm: &LlmClient,
    event: &ChangeEvent,
) -> RrResult<ReviewOutcome> {
    let trigger = match classify(event, &cfg.bot_mention) {
        Decision::Run(t) => t,
        Decision::Skip(reason) => {
            info!(%reason, "event produced no review run");
            return Ok(ReviewOutcome::Skipped {
                reason: reason.to_string(),
            });
        }
    };
    run_review(cfg, github, llm, trigger).await
}

/// Run the full pipeline for an accepted trigger.
pub async fn run_review(
    cfg: &ReviewerConfig,
    github: &GithubClient,
    llm: &LlmClient,
    trigger: ReviewTrigger,
) -> RrResult<ReviewOutcome> {
    let repo = trigger.repo.clone();
    let number = trigger.number;
    if let Some(cmd) = &trigger.command {
        info!(repo, number, command = %cmd.name, args = %cmd.args, "review requested by comment");
    }

    // Head SHA: pull_request events carry it; comment commands resolve
    // the current one.
    let head_sha = match trigger.head_sha {
        Some(sha) => sha,
        None => github.get_pull_request(&repo, number).await?.head.sha,
    };
    debug!(repo, number, head_sha, "starting review run");

    let policy = policy::resolve(github, &repo, &head_sha).await;
    let diff = github.get_diff(&repo, number).await?;

    let tasks = match plan_review(&diff, &policy, &cfg.limits) {
        ReviewPlan::Skip { reason } => {
            info!(repo, number, reason, "review skipped");
            return Ok(ReviewOutcome::Skipped {
                reason: reason.to_string(),
            });
        }
        ReviewPlan::Review { tasks } => tasks,
    };
    let files_reviewed = tasks.len();
    debug!(repo, number, files = files_reviewed, "planned model calls");

    // Fan out model calls, bounded to respect provider rate limits.
    let sem = Arc::new(Semaphore::new(cfg.limits.max_concurrency.max(1)));
    let mut handles = Vec::with_capacity(tasks.len());
    for task in tasks {
        let llm = llm.clone();
        let sem = sem.clone();
        handles.push(tokio::spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return None;
            };
            match llm.generate(&task.prompt).await {
                Ok(text) => build_finding(&task.path, task.position, &text),
                Err(e) => {
                    warn!(path = %task.path, error = %e, "model call failed, no finding for this file");
                    None
                }
            }
        }));
    }

    let mut findings = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Some(finding)) => findings.push(finding),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "review task aborted, no finding for this file"),
        }
    }
    sort_findings(&mut findings);

    if findings.is_empty() {
        info!(repo, number, files = files_reviewed, "no findings, nothing submitted");
        return Ok(ReviewOutcome::Completed {
            files_reviewed,
            findings_posted: 0,
        });
    }

    github
        .post_review(&repo, number, &head_sha, &findings)
        .await?;
    info!(repo, number, findings = findings.len(), "review submitted");
    Ok(ReviewOutcome::Completed {
        files_reviewed,
        findings_posted: findings.len(),
    })
}

/// Pure planning stage: parse the diff and decide which files get a
/// model call, with which prompt, anchored at which position.
pub fn plan_review(diff_text: &str, policy: &RepoPolicy, limits: &ReviewLimits) -> ReviewPlan {
    if diff_text.trim().is_empty() {
        return ReviewPlan::Skip {
            reason: "empty diff",
        };
    }

    let files = parser::parse_diff(diff_text);
    let mut tasks: Vec<FileTask> = Vec::new();
    let mut budget_used = 0usize;
    let mut dropped_by_limits = 0usize;

    for file in files {
        if !prompt::is_in_scope(&file.path, policy) {
            debug!(path = %file.path, "out of policy scope, skipping");
            continue;
        }
        let Some(position) = map::first_changed_position(&file) else {
            debug!(path = %file.path, "no commentable position, skipping");
            continue;
        };
        if tasks.len() >= limits.max_files_per_review {
            dropped_by_limits += 1;
            continue;
        }
        let text = prompt::assemble(&file, policy);
        let cost = text.chars().count();
        if budget_used + cost > limits.max_prompt_len {
            dropped_by_limits += 1;
            continue;
        }
        budget_used += cost;
        tasks.push(FileTask {
            path: file.path,
            position,
            prompt: text,
        });
    }

    if dropped_by_limits > 0 {
        warn!(
            dropped = dropped_by_limits,
            max_files = limits.max_files_per_review,
            max_prompt_len = limits.max_prompt_len,
            "files dropped by review limits"
        );
    }
    if tasks.is_empty() {
        return ReviewPlan::Skip {
            reason: "no reviewable files",
        };
    }
    ReviewPlan::Review { tasks }
}

/// Turn a model response into a finding, unless it is the canonical
/// "nothing to report" answer.
pub fn build_finding(path: &str, position: u32, model_text: &str) -> Option<ReviewFinding> {
    let trimmed = model_text.trim();
    if trimmed.is_empty() || trimmed == NO_ISSUES_SENTINEL {
        return None;
    }
    Some(ReviewFinding {
        path: path.to_string(),
        position,
        body: trimmed.to_string(),
    })
}

/// Stable submission order: by path, then by position.
pub fn sort_findings(findings: &mut [ReviewFinding]) {
    findings.sort_by(|a, b| a.path.cmp(&b.path).then(a.position.cmp(&b.position)));
}
