//! Error types for patch parsing and application
//!
//! Display text is fed back verbatim to the generator on retry, so every
//! variant spells out what went wrong and where.

/// Errors raised while parsing or applying a unified diff
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// Hunk header did not match `@@ -start[,count] +start[,count] @@`
    #[error("malformed hunk header: {0}")]
    MalformedHunkHeader(String),

    /// A hunk body line started with something other than ' ', '-' or '+'
    #[error("unrecognized line prefix {prefix:?} at patch line {line}")]
    UnknownLinePrefix {
        /// Offending prefix character
        prefix: char,
        /// 1-based line number within the patch text
        line: usize,
    },

    /// Hunk body line counts disagree with the counts in its header
    #[error(
        "hunk at patch line {header_line} declares -{old_count},+{new_count} \
         but its body spans {actual_old} old and {actual_new} new lines"
    )]
    InconsistentHunk {
        /// 1-based patch line of the hunk header
        header_line: usize,
        /// Declared old-side count
        old_count: usize,
        /// Declared new-side count
        new_count: usize,
        /// Old-side lines actually present (context + remove)
        actual_old: usize,
        /// New-side lines actually present (context + add)
        actual_new: usize,
    },

    /// Hunk addresses lines past the end of the original text
    #[error("hunk start {start} is beyond the end of the original ({len} lines)")]
    OutOfBounds {
        /// 1-based old-side start of the offending hunk
        start: usize,
        /// Number of lines in the original
        len: usize,
    },

    /// Hunks are out of order or overlap an earlier hunk
    #[error("hunk starting at old line {start} overlaps a previous hunk")]
    OverlappingHunks {
        /// 1-based old-side start of the offending hunk
        start: usize,
    },

    /// A context line did not match the original at its position
    #[error("context mismatch at line {line}: expected {expected:?}, found {found:?}")]
    ContextMismatch {
        /// 1-based line number in the original text
        line: usize,
        /// Context content the patch claimed
        expected: String,
        /// What the original actually contains
        found: String,
    },

    /// A remove line pointed past the end of the original
    #[error("cannot remove line {line}: original has only {len} lines")]
    RemovePastEnd {
        /// 1-based line number the hunk tried to remove
        line: usize,
        /// Number of lines in the original
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_error_display_is_verbatim_friendly() {
        let err = PatchError::ContextMismatch {
            line: 3,
            expected: "return x".to_string(),
            found: "return y".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "context mismatch at line 3: expected \"return x\", found \"return y\""
        );
    }

    #[test]
    fn out_of_bounds_display() {
        let err = PatchError::OutOfBounds { start: 12, len: 4 };
        assert!(err.to_string().contains("beyond the end of the original"));
    }
}
