//! Unified diff hunk model and parser
//!
//! Accepts the standard hunk grammar
//! `@@ -oldStart[,oldCount] +newStart[,newCount] @@` followed by lines
//! prefixed `' '` (context), `'-'` (remove) and `'+'` (add). File headers
//! (`--- `, `+++ `) and `diff `/`index ` noise outside hunk bodies are
//! skipped; anything unrecognized inside a body is an error.

use crate::error::PatchError;

/// A single line in a hunk body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    /// Unchanged line, asserts positional alignment with the original
    Context(String),
    /// Line removed from the original
    Remove(String),
    /// Line added to the patched text
    Add(String),
}

impl HunkLine {
    /// Line content without its prefix
    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            HunkLine::Context(s) | HunkLine::Remove(s) | HunkLine::Add(s) => s,
        }
    }
}

/// One contiguous block of change in a unified diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based start line on the old side (0 only for pure insertions)
    pub old_start: usize,
    /// Number of old-side lines the hunk spans
    pub old_count: usize,
    /// 1-based start line on the new side
    pub new_start: usize,
    /// Number of new-side lines the hunk spans
    pub new_count: usize,
    /// Body lines in patch order
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// Count of (added, removed) lines in this hunk
    #[must_use]
    pub fn summary(&self) -> (usize, usize) {
        let adds = self
            .lines
            .iter()
            .filter(|l| matches!(l, HunkLine::Add(_)))
            .count();
        let removes = self
            .lines
            .iter()
            .filter(|l| matches!(l, HunkLine::Remove(_)))
            .count();
        (adds, removes)
    }
}

/// Parse a unified diff into an ordered list of hunks
///
/// A patch with no hunks at all parses to an empty list; [`crate::apply`]
/// treats that as a no-op.
///
/// # Errors
/// - [`PatchError::MalformedHunkHeader`] for an unparsable `@@` line
/// - [`PatchError::UnknownLinePrefix`] for stray content inside a hunk body
/// - [`PatchError::InconsistentHunk`] when body line counts disagree with
///   the header
pub fn parse_patch(patch: &str) -> Result<Vec<Hunk>, PatchError> {
    let lines: Vec<&str> = patch.lines().collect();
    let mut hunks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("@@") {
            let hunk = parse_hunk(&lines, &mut i)?;
            hunks.push(hunk);
        } else {
            // File headers and generator noise between hunks
            i += 1;
        }
    }

    Ok(hunks)
}

/// Parse one hunk starting at `lines[*idx]` (a `@@` header line)
fn parse_hunk(lines: &[&str], idx: &mut usize) -> Result<Hunk, PatchError> {
    let header_line = *idx + 1;
    let header = lines[*idx];
    let (old_start, old_count, new_start, new_count) = parse_header(header)?;

    *idx += 1;
    let mut body = Vec::new();

    while *idx < lines.len() {
        let line = lines[*idx];

        // Next hunk or trailing file header ends this body
        if line.starts_with("@@") || line.starts_with("--- ") || line.starts_with("diff ") {
            break;
        }

        if let Some(rest) = line.strip_prefix('+') {
            body.push(HunkLine::Add(rest.to_string()));
        } else if let Some(rest) = line.strip_prefix('-') {
            body.push(HunkLine::Remove(rest.to_string()));
        } else if let Some(rest) = line.strip_prefix(' ') {
            body.push(HunkLine::Context(rest.to_string()));
        } else if line.is_empty() {
            // Diff generators strip the trailing space off blank context lines
            body.push(HunkLine::Context(String::new()));
        } else if line.starts_with('\\') {
            // "\ No newline at end of file" marker; newline handling is
            // driven by the original text, so the marker carries no data here
        } else {
            return Err(PatchError::UnknownLinePrefix {
                prefix: line.chars().next().unwrap_or('?'),
                line: *idx + 1,
            });
        }

        *idx += 1;
    }

    let actual_old = body
        .iter()
        .filter(|l| matches!(l, HunkLine::Context(_) | HunkLine::Remove(_)))
        .count();
    let actual_new = body
        .iter()
        .filter(|l| matches!(l, HunkLine::Context(_) | HunkLine::Add(_)))
        .count();

    if actual_old != old_count || actual_new != new_count {
        return Err(PatchError::InconsistentHunk {
            header_line,
            old_count,
            new_count,
            actual_old,
            actual_new,
        });
    }

    Ok(Hunk {
        old_start,
        old_count,
        new_start,
        new_count,
        lines: body,
    })
}

/// Parse `@@ -oldStart[,oldCount] +newStart[,newCount] @@`
fn parse_header(header: &str) -> Result<(usize, usize, usize, usize), PatchError> {
    let malformed = || PatchError::MalformedHunkHeader(header.to_string());

    let rest = header.strip_prefix("@@ ").ok_or_else(malformed)?;
    let end = rest.find(" @@").ok_or_else(malformed)?;
    let ranges = &rest[..end];

    let mut parts = ranges.split(' ');
    let old = parts.next().ok_or_else(malformed)?;
    let new = parts.next().ok_or_else(malformed)?;
    if parts.next().is_some() {
        return Err(malformed());
    }

    let old = old.strip_prefix('-').ok_or_else(malformed)?;
    let new = new.strip_prefix('+').ok_or_else(malformed)?;

    let (old_start, old_count) = parse_range(old).ok_or_else(malformed)?;
    let (new_start, new_count) = parse_range(new).ok_or_else(malformed)?;

    Ok((old_start, old_count, new_start, new_count))
}

/// Parse a range like `"10,5"` or `"10"` (count defaults to 1)
fn parse_range(s: &str) -> Option<(usize, usize)> {
    match s.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((s.parse().ok()?, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_simple_patch() {
        let patch = "--- a/example.py\n\
                     +++ b/example.py\n\
                     @@ -1,3 +1,4 @@\n \
                     def hello():\n\
                     -    print(\"old\")\n\
                     +    print(\"new\")\n\
                     +    print(\"extra\")\n \
                     return True\n";
        let hunks = parse_patch(patch).unwrap();
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].old_start, 1);
        assert_eq!(hunks[0].old_count, 3);
        assert_eq!(hunks[0].new_count, 4);
        assert_eq!(hunks[0].summary(), (2, 1));
    }

    #[test]
    fn parse_counts_default_to_one() {
        let patch = "@@ -5 +5 @@\n-old\n+new\n";
        let hunks = parse_patch(patch).unwrap();
        assert_eq!(hunks[0].old_count, 1);
        assert_eq!(hunks[0].new_count, 1);
    }

    #[test]
    fn parse_multiple_hunks() {
        let patch = "@@ -1,1 +1,1 @@\n-a\n+A\n@@ -3,1 +3,1 @@\n-c\n+C\n";
        let hunks = parse_patch(patch).unwrap();
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[1].old_start, 3);
    }

    #[test]
    fn parse_no_hunks_is_empty() {
        assert_eq!(parse_patch("just some prose\n").unwrap(), vec![]);
        assert_eq!(parse_patch("").unwrap(), vec![]);
    }

    #[test]
    fn parse_rejects_malformed_header() {
        let err = parse_patch("@@ -x,1 +1,1 @@\n-a\n+b\n").unwrap_err();
        assert!(matches!(err, PatchError::MalformedHunkHeader(_)));

        let err = parse_patch("@@ nonsense @@\n").unwrap_err();
        assert!(matches!(err, PatchError::MalformedHunkHeader(_)));
    }

    #[test]
    fn parse_rejects_inconsistent_counts() {
        let err = parse_patch("@@ -1,2 +1,2 @@\n-a\n+b\n").unwrap_err();
        assert!(matches!(
            err,
            PatchError::InconsistentHunk {
                old_count: 2,
                actual_old: 1,
                ..
            }
        ));
    }

    #[test]
    fn parse_rejects_unknown_prefix() {
        let err = parse_patch("@@ -1,1 +1,1 @@\n*what\n").unwrap_err();
        assert!(matches!(
            err,
            PatchError::UnknownLinePrefix { prefix: '*', .. }
        ));
    }

    #[test]
    fn parse_accepts_blank_context_lines() {
        let patch = "@@ -1,3 +1,3 @@\n a\n\n-b\n+B\n";
        let hunks = parse_patch(patch).unwrap();
        assert_eq!(hunks[0].lines[1], HunkLine::Context(String::new()));
    }

    #[test]
    fn parse_skips_no_newline_marker() {
        let patch = "@@ -1,1 +1,1 @@\n-a\n+b\n\\ No newline at end of file\n";
        let hunks = parse_patch(patch).unwrap();
        assert_eq!(hunks[0].lines.len(), 2);
    }
}
