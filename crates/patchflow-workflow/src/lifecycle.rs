//! Human review and commit state machine
//!
//! Advances a diff through `evaluator_approved -> human_approved ->
//! committed`, or to the terminal `human_rejected`. No locks are held
//! between approval and commit; a lost race surfaces as an explicit
//! stale-base error at commit time.

use std::sync::Arc;

use patchflow_diff::apply;

use crate::diff_record::{Diff, DiffStatus};
use crate::diff_store::DiffStore;
use crate::error::LifecycleError;
use crate::version_store::VersionStore;

/// Review and commit operations over persisted diffs
pub struct DiffLifecycle {
    diffs: Arc<dyn DiffStore>,
    versions: Arc<dyn VersionStore>,
}

impl DiffLifecycle {
    /// Wire up the lifecycle from its stores
    #[inline]
    #[must_use]
    pub fn new(diffs: Arc<dyn DiffStore>, versions: Arc<dyn VersionStore>) -> Self {
        Self { diffs, versions }
    }

    /// Record a human review decision
    ///
    /// Approval moves the diff to `human_approved`. Rejection moves it to
    /// the terminal `human_rejected` and stores the feedback; a retry is a
    /// brand-new orchestrator run producing a new diff.
    ///
    /// # Errors
    /// [`LifecycleError::InvalidState`] unless the diff is currently
    /// `evaluator_approved`; the diff is untouched on any error.
    pub async fn review(
        &self,
        diff_id: &str,
        approved: bool,
        feedback: Option<String>,
    ) -> Result<Diff, LifecycleError> {
        let mut diff = self.load(diff_id).await?;
        self.expect_status(&diff, DiffStatus::EvaluatorApproved)?;

        if approved {
            diff.status = DiffStatus::HumanApproved;
            tracing::info!(diff_id = %diff.id, "diff approved by human");
        } else {
            diff.status = DiffStatus::HumanRejected;
            diff.human_feedback = feedback;
            tracing::info!(diff_id = %diff.id, "diff rejected by human");
        }
        diff.updated_at = chrono::Utc::now();

        self.diffs.update(diff.clone()).await?;
        Ok(diff)
    }

    /// Commit a human-approved diff to the version store
    ///
    /// Re-reads the head and compares it to the diff's recorded base, then
    /// re-applies the stored patch against the current base text. The head
    /// comparison comes first: a drifted base whose change also breaks the
    /// patch's context must surface as the lost race it is, not as a
    /// patch-apply failure. The status transition happens only after the
    /// version-store write succeeds, so a crash in between never reports
    /// `committed` for an uncommitted patch.
    ///
    /// # Errors
    /// - [`LifecycleError::InvalidState`] unless the diff is `human_approved`
    /// - [`LifecycleError::StaleBaseVersion`] if the head drifted since
    ///   generation
    /// - [`LifecycleError::PatchApply`] if the stored patch no longer applies
    pub async fn commit(
        &self,
        diff_id: &str,
        message_override: Option<String>,
    ) -> Result<Diff, LifecycleError> {
        let mut diff = self.load(diff_id).await?;
        self.expect_status(&diff, DiffStatus::HumanApproved)?;

        let head = self.versions.head_of(&diff.target).await?;
        if head != diff.base_version {
            tracing::warn!(
                diff_id = %diff.id,
                expected = ?diff.base_version,
                actual = ?head,
                "base version drifted before commit"
            );
            return Err(LifecycleError::StaleBaseVersion {
                expected: diff.base_version,
                actual: head,
            });
        }

        let current = self.versions.current_text(&diff.target).await?;
        let patched = apply(&current, &diff.diff_content)?;

        let message = message_override.unwrap_or_else(|| diff.commit_message.clone());
        let new_version = self
            .versions
            .write(&diff.target, &patched, &message)
            .await?;

        diff.status = DiffStatus::Committed;
        diff.committed_version = Some(new_version.clone());
        diff.updated_at = chrono::Utc::now();
        self.diffs.update(diff.clone()).await?;

        tracing::info!(diff_id = %diff.id, version = %new_version, "diff committed");
        Ok(diff)
    }

    async fn load(&self, diff_id: &str) -> Result<Diff, LifecycleError> {
        self.diffs
            .get(diff_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(diff_id.to_string()))
    }

    fn expect_status(&self, diff: &Diff, expected: DiffStatus) -> Result<(), LifecycleError> {
        if diff.status != expected {
            return Err(LifecycleError::InvalidState {
                diff_id: diff.id.clone(),
                expected,
                actual: diff.status,
            });
        }
        Ok(())
    }
}
