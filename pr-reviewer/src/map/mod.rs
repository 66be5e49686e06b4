//! Diff-position mapping for inline review comments.
//!
//! Review-comment APIs anchor an inline comment by *position*: the 1-based
//! offset of a line inside a hunk, counted from the first content line
//! after the `@@` header — not the file's own line number. This module
//! converts hunk-relative indices into that coordinate and picks the line
//! a finding should anchor to.

use crate::parser::{FileDiff, Hunk};

/// Position of the line at `index` inside `hunk`, or `None` when the
/// index is out of bounds.
pub fn position_in_hunk(hunk: &Hunk, index: usize) -> Option<u32> {
    if index >= hunk.lines.len() {
        return None;
    }
    Some(index as u32 + 1)
}

/// Anchor position for a whole-file finding: the first line across the
/// file's hunks (in order) whose prefix is `+` or `-`.
///
/// Returns `None` when no hunk contains a changed line (rename, binary,
/// metadata-only). Callers drop the finding in that case instead of
/// guessing a location the provider would reject.
pub fn first_changed_position(file: &FileDiff) -> Option<u32> {
    for hunk in &file.hunks {
        let changed = hunk
            .lines
            .iter()
            .position(|l| l.starts_with('+') || l.starts_with('-'));
        if let Some(index) = changed {
            return position_in_hunk(hunk, index);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hunk(lines: &[&str]) -> Hunk {
        Hunk {
            source_start_line: 1,
            target_start_line: 1,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn file(hunks: Vec<Hunk>) -> FileDiff {
        FileDiff {
            path: "src/lib.rs".into(),
            diff: String::new(),
            hunks,
        }
    }

    #[test]
    fn position_is_one_based_within_the_hunk() {
        let h = hunk(&[" context", "+added", "-removed"]);
        assert_eq!(position_in_hunk(&h, 0), Some(1));
        assert_eq!(position_in_hunk(&h, 2), Some(3));
        assert_eq!(position_in_hunk(&h, 3), None);
    }

    #[test]
    fn first_changed_line_after_leading_context_maps_to_position_two() {
        let f = file(vec![hunk(&[" context", "+added", " more context"])]);
        assert_eq!(first_changed_position(&f), Some(2));
    }

    #[test]
    fn scans_later_hunks_when_the_first_has_no_changes() {
        let f = file(vec![
            hunk(&[" only", " context"]),
            hunk(&[" lead", "-gone"]),
        ]);
        assert_eq!(first_changed_position(&f), Some(2));
    }

    #[test]
    fn no_changed_line_produces_no_position() {
        let f = file(vec![hunk(&[" a", " b"])]);
        assert_eq!(first_changed_position(&f), None);
        assert_eq!(first_changed_position(&file(Vec::new())), None);
    }
}
