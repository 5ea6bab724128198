//! The durable review unit
//!
//! A `Diff` is created when the evaluator approves a patch and is advanced
//! by human action (approve/reject) and finally by commit. Status moves
//! strictly forward; a rejected diff is terminal and any retry produces a
//! brand-new record, preserving full audit history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    /// Passed evaluator review, awaiting human review
    EvaluatorApproved,
    /// Approved by a human, awaiting commit
    HumanApproved,
    /// Rejected by a human; terminal for this record
    HumanRejected,
    /// Committed to the version store; terminal
    Committed,
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DiffStatus::EvaluatorApproved => "evaluator_approved",
            DiffStatus::HumanApproved => "human_approved",
            DiffStatus::HumanRejected => "human_rejected",
            DiffStatus::Committed => "committed",
        };
        f.write_str(s)
    }
}

/// An evaluator-approved patch awaiting human review and commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    /// Globally unique id
    pub id: String,
    /// Owning session
    pub session_id: String,
    /// Version-store target the patch applies to
    pub target: String,
    /// Version-store head captured when generation started
    pub base_version: Option<String>,
    /// The proposed unified diff text
    pub diff_content: String,
    /// Lifecycle status; the only mutable field besides feedback and the
    /// committed version
    pub status: DiffStatus,
    /// Why the evaluator approved the patch
    pub evaluator_reasoning: String,
    /// Evaluator-suggested commit message
    pub commit_message: String,
    /// Feedback recorded on human rejection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_feedback: Option<String>,
    /// Version id written at commit time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed_version: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Diff {
    /// Create a freshly evaluator-approved diff
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn evaluator_approved(
        session_id: impl Into<String>,
        target: impl Into<String>,
        base_version: Option<String>,
        diff_content: impl Into<String>,
        evaluator_reasoning: impl Into<String>,
        commit_message: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            target: target.into(),
            base_version,
            diff_content: diff_content.into(),
            status: DiffStatus::EvaluatorApproved,
            evaluator_reasoning: evaluator_reasoning.into(),
            commit_message: commit_message.into(),
            human_feedback: None,
            committed_version: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this diff can still move forward
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            DiffStatus::HumanRejected | DiffStatus::Committed
        )
    }
}
