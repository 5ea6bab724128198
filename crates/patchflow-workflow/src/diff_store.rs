//! Diff record persistence seam

use async_trait::async_trait;

use crate::diff_record::Diff;
use crate::error::StorageError;

/// Durable storage for diff records
#[async_trait]
pub trait DiffStore: Send + Sync {
    /// Persist a new diff
    async fn insert(&self, diff: Diff) -> Result<(), StorageError>;

    /// Fetch a diff by id
    async fn get(&self, diff_id: &str) -> Result<Option<Diff>, StorageError>;

    /// Overwrite an existing diff (status transitions, feedback, commit id)
    async fn update(&self, diff: Diff) -> Result<(), StorageError>;
}
