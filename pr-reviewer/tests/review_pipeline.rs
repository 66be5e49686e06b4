//! End-to-end tests for the pure pipeline stages: diff text in, planned
//! model calls and findings out. Collaborator I/O (GitHub, model) is
//! exercised only through its inputs and outputs here.

use pr_reviewer::config::ReviewLimits;
use pr_reviewer::llm::NO_ISSUES_SENTINEL;
use pr_reviewer::policy::RepoPolicy;
use pr_reviewer::review::{ReviewPlan, build_finding, plan_review, sort_findings};

/// Two files; the first hunk of each starts with a context line followed
/// by a `+` line at index 1.
const TWO_FILE_DIFF: &str = "\
diff --git a/src/engine.rs b/src/engine.rs
index 3c1a2b4..9d8e7f6 100644
--- a/src/engine.rs
+++ b/src/engine.rs
@@ -12,6 +12,7 @@ impl Engine {
 fn start(&mut self) {
+        self.warmup();
     self.running = true;
 }
diff --git a/src/docs/readme.md b/src/docs/readme.md
--- a/src/docs/readme.md
+++ b/src/docs/readme.md
@@ -1,2 +1,2 @@
 # Guide
+New sentence.
";

fn limits() -> ReviewLimits {
    ReviewLimits::default()
}

#[test]
fn one_sentinel_and_one_real_finding_submit_exactly_one_comment() {
    let plan = plan_review(TWO_FILE_DIFF, &RepoPolicy::default(), &limits());
    let tasks = match plan {
        ReviewPlan::Review { tasks } => tasks,
        ReviewPlan::Skip { reason } => panic!("unexpected skip: {reason}"),
    };
    assert_eq!(tasks.len(), 2);

    // Simulate the model: clean bill for the first file, a finding for
    // the second. The first changed line of each file sits at index 1 of
    // its hunk, so the anchor position is 2.
    let mut findings: Vec<_> = tasks
        .iter()
        .map(|t| {
            let response = if t.path == "src/engine.rs" {
                NO_ISSUES_SENTINEL.to_string()
            } else {
                "This sentence needs a citation.".to_string()
            };
            build_finding(&t.path, t.position, &response)
        })
        .flatten()
        .collect();
    sort_findings(&mut findings);

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].path, "src/docs/readme.md");
    assert_eq!(findings[0].position, 2);
    assert_eq!(findings[0].body, "This sentence needs a citation.");
}

#[test]
fn empty_diff_plans_nothing() {
    let plan = plan_review("", &RepoPolicy::default(), &limits());
    assert_eq!(
        plan,
        ReviewPlan::Skip {
            reason: "empty diff"
        }
    );
    let plan = plan_review("   \n", &RepoPolicy::default(), &limits());
    assert!(matches!(plan, ReviewPlan::Skip { .. }));
}

#[test]
fn excluded_path_gets_no_model_call_regardless_of_includes() {
    let policy = RepoPolicy {
        exclude_paths: vec!["src/docs".into()],
        include_paths: vec!["src".into()],
        ..RepoPolicy::default()
    };
    let plan = plan_review(TWO_FILE_DIFF, &policy, &limits());
    let tasks = match plan {
        ReviewPlan::Review { tasks } => tasks,
        ReviewPlan::Skip { reason } => panic!("unexpected skip: {reason}"),
    };
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].path, "src/engine.rs");
}

#[test]
fn everything_filtered_out_is_a_skip() {
    let policy = RepoPolicy {
        exclude_paths: vec!["src".into()],
        ..RepoPolicy::default()
    };
    assert_eq!(
        plan_review(TWO_FILE_DIFF, &policy, &limits()),
        ReviewPlan::Skip {
            reason: "no reviewable files"
        }
    );
}

#[test]
fn rename_only_file_is_not_planned() {
    let diff = "\
diff --git a/old.rs b/new.rs
similarity index 100%
rename from old.rs
rename to new.rs
diff --git a/src/a.rs b/src/a.rs
@@ -1 +1 @@
-x
+y
";
    let plan = plan_review(diff, &RepoPolicy::default(), &limits());
    let tasks = match plan {
        ReviewPlan::Review { tasks } => tasks,
        ReviewPlan::Skip { reason } => panic!("unexpected skip: {reason}"),
    };
    // The rename has no changed line to anchor to; only src/a.rs runs.
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].path, "src/a.rs");
    assert_eq!(tasks[0].position, 1);
}

#[test]
fn file_cap_limits_planned_calls() {
    let mut diff = String::new();
    for i in 0..5 {
        diff.push_str(&format!(
            "diff --git a/f{i}.rs b/f{i}.rs\n@@ -1 +1 @@\n+line {i}\n"
        ));
    }
    let limits = ReviewLimits {
        max_files_per_review: 3,
        ..ReviewLimits::default()
    };
    let plan = plan_review(&diff, &RepoPolicy::default(), &limits);
    let tasks = match plan {
        ReviewPlan::Review { tasks } => tasks,
        ReviewPlan::Skip { reason } => panic!("unexpected skip: {reason}"),
    };
    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks[0].path, "f0.rs");
    assert_eq!(tasks[2].path, "f2.rs");
}

#[test]
fn prompt_budget_drops_overflowing_files() {
    let diff = "\
diff --git a/a.rs b/a.rs
@@ -1 +1 @@
+first
diff --git a/b.rs b/b.rs
@@ -1 +1 @@
+second
";
    // Budget generous enough for one default prompt but not two.
    let probe = plan_review(diff, &RepoPolicy::default(), &ReviewLimits::default());
    let one_prompt_len = match &probe {
        ReviewPlan::Review { tasks } => tasks[0].prompt.chars().count(),
        ReviewPlan::Skip { reason } => panic!("unexpected skip: {reason}"),
    };
    let limits = ReviewLimits {
        max_prompt_len: one_prompt_len + 10,
        ..ReviewLimits::default()
    };
    let plan = plan_review(diff, &RepoPolicy::default(), &limits);
    let tasks = match plan {
        ReviewPlan::Review { tasks } => tasks,
        ReviewPlan::Skip { reason } => panic!("unexpected skip: {reason}"),
    };
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].path, "a.rs");
}

#[test]
fn custom_prompt_from_policy_drives_the_planned_prompt() {
    let policy = RepoPolicy {
        custom_prompt: Some("Look at {filename} in {output_language}".into()),
        review_language: "spanish".into(),
        ..RepoPolicy::default()
    };
    let plan = plan_review(TWO_FILE_DIFF, &policy, &limits());
    let tasks = match plan {
        ReviewPlan::Review { tasks } => tasks,
        ReviewPlan::Skip { reason } => panic!("unexpected skip: {reason}"),
    };
    assert_eq!(tasks[0].prompt, "Look at src/engine.rs in spanish");
}
