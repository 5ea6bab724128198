//! Single-pass patch application
//!
//! Walks the original text and the hunk list together exactly once, left to
//! right. Reverse hunk-by-hunk splicing invalidates line indices as soon as
//! a hunk changes the line count; the single forward cursor cannot.

use crate::error::PatchError;
use crate::hunk::{parse_patch, Hunk, HunkLine};

/// Apply a unified diff to the original text
///
/// A patch with zero hunks returns the original unchanged. Trailing-newline
/// presence of the original is preserved exactly.
///
/// # Errors
/// Any [`PatchError`] from parsing, plus [`PatchError::OutOfBounds`],
/// [`PatchError::OverlappingHunks`], [`PatchError::ContextMismatch`] and
/// [`PatchError::RemovePastEnd`] from the walk itself.
pub fn apply(original: &str, patch: &str) -> Result<String, PatchError> {
    let hunks = parse_patch(patch)?;
    apply_hunks(original, &hunks)
}

/// Apply pre-parsed hunks to the original text
pub fn apply_hunks(original: &str, hunks: &[Hunk]) -> Result<String, PatchError> {
    if hunks.is_empty() {
        return Ok(original.to_string());
    }

    let lines: Vec<&str> = original.lines().collect();
    let had_trailing_newline = original.ends_with('\n');

    let mut output: Vec<&str> = Vec::with_capacity(lines.len());
    let mut cursor = 0usize; // 0-based index into `lines`

    for hunk in hunks {
        let anchor = anchor_of(hunk, lines.len())?;
        if anchor < cursor {
            return Err(PatchError::OverlappingHunks {
                start: hunk.old_start,
            });
        }

        // Copy untouched lines up to the hunk
        output.extend_from_slice(&lines[cursor..anchor]);
        cursor = anchor;

        for line in &hunk.lines {
            match line {
                HunkLine::Context(expected) => {
                    let found = lines.get(cursor).copied().ok_or_else(|| {
                        PatchError::ContextMismatch {
                            line: cursor + 1,
                            expected: expected.clone(),
                            found: "<end of file>".to_string(),
                        }
                    })?;
                    if found != expected {
                        return Err(PatchError::ContextMismatch {
                            line: cursor + 1,
                            expected: expected.clone(),
                            found: found.to_string(),
                        });
                    }
                    output.push(found);
                    cursor += 1;
                }
                HunkLine::Remove(_) => {
                    if cursor >= lines.len() {
                        return Err(PatchError::RemovePastEnd {
                            line: cursor + 1,
                            len: lines.len(),
                        });
                    }
                    cursor += 1;
                }
                HunkLine::Add(text) => {
                    output.push(text);
                }
            }
        }
    }

    // Everything after the last hunk
    output.extend_from_slice(&lines[cursor..]);

    let mut result = output.join("\n");
    if had_trailing_newline && !result.is_empty() {
        result.push('\n');
    }
    Ok(result)
}

/// 0-based insertion index of a hunk, with bounds checks
///
/// For a pure insertion (`old_count == 0`) the convention is that
/// `old_start` names the line *after which* to insert, so 0 means the very
/// top of the file.
fn anchor_of(hunk: &Hunk, len: usize) -> Result<usize, PatchError> {
    let anchor = if hunk.old_count == 0 {
        hunk.old_start
    } else {
        // old_start is 1-based for non-empty hunks
        match hunk.old_start.checked_sub(1) {
            Some(a) => a,
            None => {
                return Err(PatchError::OutOfBounds {
                    start: hunk.old_start,
                    len,
                })
            }
        }
    };

    if anchor > len {
        return Err(PatchError::OutOfBounds {
            start: hunk.old_start,
            len,
        });
    }
    Ok(anchor)
}
