//! Prompt assembly for per-file review requests.
//!
//! Scope filtering happens here too: a file that the policy excludes is
//! never turned into a prompt, so it costs no model call. Custom prompt
//! templates are rendered by a single-pass substitution over a fixed
//! allow-list of placeholders; anything else in the template (including
//! placeholder-looking text inside the diff itself) passes through
//! verbatim.

use crate::parser::FileDiff;
use crate::policy::RepoPolicy;

/// Placeholders a custom template may use.
const PLACEHOLDER_FILENAME: &str = "filename";
const PLACEHOLDER_FILE_DIFF: &str = "file_diff";
const PLACEHOLDER_OUTPUT_LANGUAGE: &str = "output_language";

/// Whether a file path is in scope under the policy.
///
/// Exclude prefixes win over include prefixes; an empty include list
/// means everything not excluded is in scope.
pub fn is_in_scope(path: &str, policy: &RepoPolicy) -> bool {
    if policy.exclude_paths.iter().any(|p| path.starts_with(p.as_str())) {
        return false;
    }
    if !policy.include_paths.is_empty()
        && !policy.include_paths.iter().any(|p| path.starts_with(p.as_str()))
    {
        return false;
    }
    true
}

/// Build the model request text for one file.
pub fn assemble(file: &FileDiff, policy: &RepoPolicy) -> String {
    match &policy.custom_prompt {
        Some(template) => render_template(template, file, &policy.review_language),
        None => default_prompt(file, &policy.review_language),
    }
}

/// The stock instructional prompt.
fn default_prompt(file: &FileDiff, output_language: &str) -> String {
    let mut s = String::new();
    s.push_str("You are an AI assistant specialized in reviewing code.\n");
    s.push_str(&format!(
        "Review the following code changes for the file '{}'.\n",
        file.path
    ));
    s.push_str("Provide concise and actionable feedback. Focus on potential bugs, performance issues, security vulnerabilities, and best practices.\n");
    s.push_str("If there are no issues, state 'No issues found.'.\n");
    s.push_str(&format!("\nOutput language: {output_language}\n"));
    s.push_str(&format!("\nCode Diff for {}:\n", file.path));
    s.push_str("```diff\n");
    s.push_str(&file.diff);
    s.push_str("\n```\n");
    s
}

/// Render a custom template in one pass.
///
/// Only `{filename}`, `{file_diff}` and `{output_language}` are
/// substituted. Unknown placeholders and stray braces are copied through
/// unchanged, and substituted values are never re-scanned.
fn render_template(template: &str, file: &FileDiff, output_language: &str) -> String {
    let mut out = String::with_capacity(template.len() + file.diff.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) => {
                let key = &after_open[..close];
                match key {
                    PLACEHOLDER_FILENAME => out.push_str(&file.path),
                    PLACEHOLDER_FILE_DIFF => out.push_str(&file.diff),
                    PLACEHOLDER_OUTPUT_LANGUAGE => out.push_str(output_language),
                    _ => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after_open[close + 1..];
            }
            None => {
                // Unterminated brace: keep the remainder as-is.
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}
