//! Webhook event decoding and classification.
//!
//! Payloads are decoded into typed shapes up front; missing or wrongly
//! typed fields surface as serde errors at the boundary instead of
//! lookup failures deep in the pipeline. Classification itself is a pure
//! function over the decoded event: same input, same decision.

use std::fmt;

use serde::Deserialize;

/// Commands the bot acts on when mentioned in a PR comment.
const REVIEW_COMMANDS: &[&str] = &["review", "re-review"];

/// Inbound webhook event, tagged by the delivery's event-type header.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    PullRequest(PullRequestEvent),
    IssueComment(IssueCommentEvent),
}

impl ChangeEvent {
    /// Decode a raw payload for the given event-type tag.
    ///
    /// Returns `Ok(None)` for event types the reviewer does not model;
    /// a malformed payload of a supported type is a decode error.
    pub fn decode(event_type: &str, payload: &[u8]) -> Result<Option<Self>, serde_json::Error> {
        match event_type {
            "pull_request" => Ok(Some(Self::PullRequest(serde_json::from_slice(payload)?))),
            "issue_comment" => Ok(Some(Self::IssueComment(serde_json::from_slice(payload)?))),
            _ => Ok(None),
        }
    }
}

/// `pull_request` payload, reduced to the fields the classifier reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub repository: Repository,
    pub pull_request: PullRequestInfo,
}

/// `issue_comment` payload, reduced to the fields the classifier reads.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub repository: Repository,
    pub issue: IssueInfo,
    pub comment: CommentInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    /// "owner/name".
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestInfo {
    pub number: u64,
    #[serde(default)]
    pub draft: bool,
    pub head: CommitRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueInfo {
    pub number: u64,
    /// Present when the issue is actually a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentInfo {
    #[serde(default)]
    pub body: String,
}

/// A bot command extracted from a comment body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotCommand {
    pub name: String,
    /// Remaining tokens after the command, joined by single spaces.
    pub args: String,
}

/// What a review run needs to start.
#[derive(Debug, Clone)]
pub struct ReviewTrigger {
    pub repo: String,
    pub number: u64,
    /// Known for pull_request events; `None` for comment commands, where
    /// the current head must be looked up before reviewing.
    pub head_sha: Option<String>,
    /// The command that triggered the run, if any.
    pub command: Option<BotCommand>,
}

/// Classifier output.
#[derive(Debug, Clone)]
pub enum Decision {
    Run(ReviewTrigger),
    Skip(SkipReason),
}

/// Why an event produced no review run. A normal no-op, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedAction(String),
    DraftPullRequest,
    NotAPullRequest,
    NoCommand,
    UnknownCommand(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedAction(a) => write!(f, "unsupported action: {a}"),
            Self::DraftPullRequest => write!(f, "pull request is a draft"),
            Self::NotAPullRequest => write!(f, "comment is not on a pull request"),
            Self::NoCommand => write!(f, "no bot command in comment"),
            Self::UnknownCommand(c) => write!(f, "unknown command: {c}"),
        }
    }
}

/// Decide whether an event triggers a review.
///
/// - `pull_request` with action opened/synchronize/reopened and not a
///   draft runs against the event's own head SHA.
/// - `issue_comment` created on a PR runs when the body carries the bot
///   mention followed by a recognized command; the head SHA is resolved
///   later by the orchestrator.
pub fn classify(event: &ChangeEvent, bot_mention: &str) -> Decision {
    match event {
        ChangeEvent::PullRequest(e) => {
            if !matches!(e.action.as_str(), "opened" | "synchronize" | "reopened") {
                return Decision::Skip(SkipReason::UnsupportedAction(e.action.clone()));
            }
            if e.pull_request.draft {
                return Decision::Skip(SkipReason::DraftPullRequest);
            }
            Decision::Run(ReviewTrigger {
                repo: e.repository.full_name.clone(),
                number: e.pull_request.number,
                head_sha: Some(e.pull_request.head.sha.clone()),
                command: None,
            })
        }
        ChangeEvent::IssueComment(e) => {
            if e.action != "created" {
                return Decision::Skip(SkipReason::UnsupportedAction(e.action.clone()));
            }
            if e.issue.pull_request.is_none() {
                return Decision::Skip(SkipReason::NotAPullRequest);
            }
            let command = match parse_command(&e.comment.body, bot_mention) {
                Some(c) => c,
                None => return Decision::Skip(SkipReason::NoCommand),
            };
            if !REVIEW_COMMANDS.contains(&command.name.as_str()) {
                return Decision::Skip(SkipReason::UnknownCommand(command.name));
            }
            Decision::Run(ReviewTrigger {
                repo: e.repository.full_name.clone(),
                number: e.issue.number,
                head_sha: None,
                command: Some(command),
            })
        }
    }
}

/// Extract the first bot command from a comment body.
///
/// The mention must appear as a whole whitespace-delimited token; the
/// next token on the same line is the command and the rest are its args.
/// Lines where the mention has nothing after it are passed over, so a
/// later line of the same comment can still carry the command.
pub fn parse_command(body: &str, bot_mention: &str) -> Option<BotCommand> {
    for line in body.lines() {
        let mut tokens = line.split_whitespace();
        if !tokens.any(|t| t == bot_mention) {
            continue;
        }
        // `tokens` now yields everything after the mention.
        if let Some(name) = tokens.next() {
            return Some(BotCommand {
                name: name.to_string(),
                args: tokens.collect::<Vec<_>>().join(" "),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENTION: &str = "@pr-review-bot";

    fn pr_payload(action: &str, draft: bool) -> Vec<u8> {
        serde_json::json!({
            "action": action,
            "repository": { "full_name": "acme/widgets" },
            "pull_request": {
                "number": 7,
                "draft": draft,
                "head": { "sha": "abc123" }
            }
        })
        .to_string()
        .into_bytes()
    }

    fn comment_payload(action: &str, on_pr: bool, body: &str) -> Vec<u8> {
        let mut issue = serde_json::json!({ "number": 7 });
        if on_pr {
            issue["pull_request"] = serde_json::json!({ "url": "https://example.test" });
        }
        serde_json::json!({
            "action": action,
            "repository": { "full_name": "acme/widgets" },
            "issue": issue,
            "comment": { "body": body }
        })
        .to_string()
        .into_bytes()
    }

    fn decode(event_type: &str, payload: &[u8]) -> ChangeEvent {
        ChangeEvent::decode(event_type, payload).unwrap().unwrap()
    }

    #[test]
    fn opened_non_draft_pull_request_runs_with_its_head_sha() {
        let event = decode("pull_request", &pr_payload("opened", false));
        match classify(&event, MENTION) {
            Decision::Run(t) => {
                assert_eq!(t.repo, "acme/widgets");
                assert_eq!(t.number, 7);
                assert_eq!(t.head_sha.as_deref(), Some("abc123"));
                assert!(t.command.is_none());
            }
            Decision::Skip(r) => panic!("unexpected skip: {r}"),
        }
    }

    #[test]
    fn draft_pull_request_is_skipped() {
        let event = decode("pull_request", &pr_payload("opened", true));
        match classify(&event, MENTION) {
            Decision::Skip(SkipReason::DraftPullRequest) => {}
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn synchronize_runs_and_closed_is_skipped() {
        let event = decode("pull_request", &pr_payload("synchronize", false));
        assert!(matches!(classify(&event, MENTION), Decision::Run(_)));

        let event = decode("pull_request", &pr_payload("closed", false));
        assert!(matches!(
            classify(&event, MENTION),
            Decision::Skip(SkipReason::UnsupportedAction(_))
        ));
    }

    #[test]
    fn comment_command_with_args_is_parsed() {
        let body = format!("hello {MENTION} re-review now");
        let event = decode("issue_comment", &comment_payload("created", true, &body));
        match classify(&event, MENTION) {
            Decision::Run(t) => {
                let cmd = t.command.expect("command");
                assert_eq!(cmd.name, "re-review");
                assert_eq!(cmd.args, "now");
                assert!(t.head_sha.is_none());
            }
            Decision::Skip(r) => panic!("unexpected skip: {r}"),
        }
    }

    #[test]
    fn mention_alone_yields_no_command() {
        let event = decode("issue_comment", &comment_payload("created", true, MENTION));
        assert!(matches!(
            classify(&event, MENTION),
            Decision::Skip(SkipReason::NoCommand)
        ));
    }

    #[test]
    fn mention_must_be_a_whole_token() {
        let body = format!("{MENTION}s review");
        assert_eq!(parse_command(&body, MENTION), None);
    }

    #[test]
    fn first_command_bearing_line_wins() {
        let body = format!("{MENTION}\nplease {MENTION} review src\n{MENTION} re-review");
        let cmd = parse_command(&body, MENTION).expect("command");
        assert_eq!(cmd.name, "review");
        assert_eq!(cmd.args, "src");
    }

    #[test]
    fn comment_on_plain_issue_is_skipped() {
        let body = format!("{MENTION} review");
        let event = decode("issue_comment", &comment_payload("created", false, &body));
        assert!(matches!(
            classify(&event, MENTION),
            Decision::Skip(SkipReason::NotAPullRequest)
        ));
    }

    #[test]
    fn unknown_command_is_skipped() {
        let body = format!("{MENTION} deploy prod");
        let event = decode("issue_comment", &comment_payload("created", true, &body));
        assert!(matches!(
            classify(&event, MENTION),
            Decision::Skip(SkipReason::UnknownCommand(c)) if c == "deploy"
        ));
    }

    #[test]
    fn unsupported_event_type_decodes_to_none() {
        assert!(ChangeEvent::decode("push", b"{}").unwrap().is_none());
    }

    #[test]
    fn malformed_supported_payload_is_a_decode_error() {
        assert!(ChangeEvent::decode("pull_request", b"{\"action\":1}").is_err());
    }
}
