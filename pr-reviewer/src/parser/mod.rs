//! Unified-diff parser.
//!
//! Turns the raw patch text of a pull request into per-file sections with
//! addressable hunks. Tolerant by design:
//! - Works even if file headers (`diff --git`) are missing (hunks-only input).
//! - Hunk-header line counts (`@@ -a,b +c,d @@`) are optional and unused;
//!   only the start lines matter.
//! - Never fails on malformed input; lines it cannot interpret stay
//!   verbatim in the enclosing file's raw diff text.

use serde::{Deserialize, Serialize};

/// A contiguous block of change inside one file's diff.
///
/// `lines` keeps the raw diff lines in their original order, each still
/// carrying its `+` / `-` / context-space prefix. That ordering is what
/// the position mapper counts over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// 1-based start line in the pre-change file.
    pub source_start_line: u32,
    /// 1-based start line in the post-change file.
    pub target_start_line: u32,
    /// Raw diff lines, prefixes included.
    pub lines: Vec<String>,
}

/// One file touched by the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Post-change ("b/" side) path.
    pub path: String,
    /// Hunks in source order.
    pub hunks: Vec<Hunk>,
    /// Raw diff text for this file: metadata lines, hunk headers and hunk
    /// lines joined as they appeared. Empty when the file has no hunks
    /// (pure rename, mode change, binary).
    pub diff: String,
}

/// Parse unified diff text into ordered per-file sections.
///
/// A `diff --git a/<old> b/<new>` line opens a file section whose path is
/// the `<new>` side. A `@@` header opens a hunk inside the current
/// section; content before the first `@@` of a file is retained only in
/// the raw diff text. A hunk header arriving before any file header opens
/// an implicit section with an empty path, which is what makes re-parsing
/// a single file's retained text yield the same hunk structure.
pub fn parse_diff(input: &str) -> Vec<FileDiff> {
    let mut files: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileSection> = None;

    for line in input.lines() {
        if let Some(path) = parse_file_header(line) {
            if let Some(section) = current.take() {
                files.push(section.finish());
            }
            current = Some(FileSection::new(path.to_string()));
            continue;
        }

        if let Some((src, tgt)) = parse_hunk_header(line) {
            let section = current.get_or_insert_with(|| FileSection::new(String::new()));
            section.raw.push(line.to_string());
            section.hunks.push(Hunk {
                source_start_line: src,
                target_start_line: tgt,
                lines: Vec::new(),
            });
            continue;
        }

        if let Some(section) = current.as_mut() {
            section.raw.push(line.to_string());
            if let Some(hunk) = section.hunks.last_mut() {
                hunk.lines.push(line.to_string());
            }
        }
        // Content before any section at all (prologue noise) is dropped.
    }

    if let Some(section) = current.take() {
        files.push(section.finish());
    }
    files
}

/// In-progress file section while scanning.
struct FileSection {
    path: String,
    hunks: Vec<Hunk>,
    raw: Vec<String>,
}

impl FileSection {
    fn new(path: String) -> Self {
        Self {
            path,
            hunks: Vec::new(),
            raw: Vec::new(),
        }
    }

    fn finish(self) -> FileDiff {
        // A section without hunks carries no reviewable text.
        let diff = if self.hunks.is_empty() {
            String::new()
        } else {
            self.raw.join("\n")
        };
        FileDiff {
            path: self.path,
            hunks: self.hunks,
            diff,
        }
    }
}

/// Match `diff --git a/<old> b/<new>` and return the `<new>` path.
fn parse_file_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("diff --git a/")?;
    let (_, new_path) = rest.split_once(" b/")?;
    if new_path.is_empty() {
        return None;
    }
    Some(new_path)
}

/// Match `@@ -<src>[,<n>] +<tgt>[,<m>] @@` and return the two start lines.
///
/// The count suffixes are accepted and ignored. Returns `None` for
/// anything that does not look like a hunk header, in which case the line
/// is treated as plain content.
fn parse_hunk_header(line: &str) -> Option<(u32, u32)> {
    let rest = line.strip_prefix("@@ -")?;
    let (ranges, _) = rest.split_once(" @@")?;
    let (src_part, tgt_part) = ranges.split_once(" +")?;
    let src = parse_start(src_part)?;
    let tgt = parse_start(tgt_part)?;
    Some((src, tgt))
}

/// Parse "12,7" or "12" into the start line.
fn parse_start(s: &str) -> Option<u32> {
    let start = match s.split_once(',') {
        Some((start, _count)) => start,
        None => s,
    };
    start.parse().ok()
}
