//! Error types for orchestration and the diff lifecycle
//!
//! The taxonomy keeps recoverable generation failures, terminal exhaustion,
//! caller bugs (wrong lifecycle state) and lost commit races distinct; none
//! of them are ever silently coerced into one another.

use patchflow_diff::PatchError;

use crate::diff_record::DiffStatus;

/// Storage seam failures (diff store and version store)
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// Backend rejected or failed the operation
    #[error("storage backend failure: {0}")]
    Backend(String),

    /// The named target has no content in the version store
    #[error("unknown target: {0}")]
    UnknownTarget(String),
}

/// Failures of a whole orchestrator run
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The retry bound was reached without an approved patch
    #[error("iteration limit reached without approval after {attempts} attempts")]
    IterationExhausted {
        /// Generation attempts actually made
        attempts: u32,
    },

    /// A capability implementation failed outright
    #[error(transparent)]
    Capability(#[from] crate::capability::CapabilityError),

    /// A storage seam failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures of a review or commit operation
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// No diff with that id
    #[error("diff not found: {0}")]
    NotFound(String),

    /// Operation attempted against a diff in the wrong state
    ///
    /// Always a caller bug or a race; surfaced immediately, never retried,
    /// and guaranteed to have produced zero side effects.
    #[error("diff {diff_id} is {actual}, expected {expected}")]
    InvalidState {
        /// Diff the operation targeted
        diff_id: String,
        /// Status the operation requires
        expected: DiffStatus,
        /// Status the diff is actually in
        actual: DiffStatus,
    },

    /// The stored patch no longer applies to the current base text
    #[error("failed to apply stored patch: {0}")]
    PatchApply(#[from] PatchError),

    /// The base version drifted between approval and commit
    ///
    /// Distinct from a patch-apply failure so the caller can re-derive the
    /// diff against the new base instead of blindly retrying.
    #[error("stale base version: diff was generated against {expected:?} but head is {actual:?}")]
    StaleBaseVersion {
        /// Base version recorded on the diff
        expected: Option<String>,
        /// Version-store head observed at commit time
        actual: Option<String>,
    },

    /// A storage seam failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_display_names_both_states() {
        let err = LifecycleError::InvalidState {
            diff_id: "d1".to_string(),
            expected: DiffStatus::EvaluatorApproved,
            actual: DiffStatus::Committed,
        };
        let text = err.to_string();
        assert!(text.contains("committed"));
        assert!(text.contains("evaluator_approved"));
    }

    #[test]
    fn stale_base_is_not_a_patch_error() {
        let err = LifecycleError::StaleBaseVersion {
            expected: Some("aaa".to_string()),
            actual: Some("bbb".to_string()),
        };
        assert!(err.to_string().starts_with("stale base version"));
    }
}
