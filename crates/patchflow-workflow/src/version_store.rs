//! Version store seam
//!
//! The underlying version-control system (the original used per-project git
//! repositories) is external; the workflow only needs head inspection, the
//! current text of a target, and an append-style write that returns the new
//! version id. Commit-time staleness is detected by comparing heads, never
//! prevented by locking.

use async_trait::async_trait;

use crate::error::StorageError;

/// Append-only versioned content storage
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Current head version id of a target, if it has any versions
    async fn head_of(&self, target: &str) -> Result<Option<String>, StorageError>;

    /// Text content at the current head
    ///
    /// # Errors
    /// [`StorageError::UnknownTarget`] when the target has no versions.
    async fn current_text(&self, target: &str) -> Result<String, StorageError>;

    /// Write new content as a child of the current head
    ///
    /// Returns the new version id.
    async fn write(
        &self,
        target: &str,
        content: &str,
        message: &str,
    ) -> Result<String, StorageError>;
}
