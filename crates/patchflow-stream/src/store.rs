//! Message persistence seam and the per-session write queue
//!
//! Persistence is issued in the background so transport emission never waits
//! on the store, but writes for one session flow through a single queue and
//! a single writer task. That keeps storage order identical to emission
//! order even when the store is slow.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::StoreError;
use crate::message::ConversationMessage;

/// Durable conversation message storage
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert a message, idempotently by id
    ///
    /// A second write with an existing id must be a no-op keeping the first
    /// content, not an error.
    async fn upsert(&self, message: ConversationMessage) -> Result<(), StoreError>;
}

/// Ordered, per-session background persistence queue
///
/// Cloning shares the queue. The writer task is detached: it drains every
/// message already enqueued even if the enqueuing run is cancelled, so
/// partial transcripts survive.
#[derive(Debug, Clone)]
pub struct PersistenceQueue {
    tx: mpsc::UnboundedSender<ConversationMessage>,
}

impl PersistenceQueue {
    /// Spawn the writer task for one session's messages
    #[must_use]
    pub fn spawn(store: Arc<dyn MessageStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ConversationMessage>();

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let id = message.id.clone();
                if let Err(e) = store.upsert(message).await {
                    tracing::error!(message_id = %id, error = %e, "failed to persist message");
                }
            }
        });

        Self { tx }
    }

    /// Enqueue a message for persistence without waiting for the write
    pub fn enqueue(&self, message: ConversationMessage) {
        if self.tx.send(message).is_err() {
            // Writer gone; only possible during shutdown
            tracing::warn!("persistence queue closed, dropping message");
        }
    }
}
