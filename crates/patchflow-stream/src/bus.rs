//! Realtime transport seam
//!
//! The core publishes progress to connected clients through this trait.
//! Delivery is fire-and-forget, at-most-once; the core never blocks on
//! subscriber acknowledgment and never fails a run over a publish error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BusError;
use crate::message::ConversationMessage;

/// Events fanned out to realtime subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusEvent {
    /// A new conversation message exists
    ConversationMessage {
        /// The projected message
        message: ConversationMessage,
    },
    /// A proposed patch failed validation during a run
    ValidationError {
        /// Owning session
        session_id: String,
        /// Iteration that produced the invalid patch
        iteration: u32,
        /// Verbatim validation diagnostic
        error: String,
    },
    /// The evaluator approved a patch and a diff is awaiting human review
    DiffCreated {
        /// Id of the new diff record
        diff_id: String,
        /// Owning session
        session_id: String,
        /// Evaluator-suggested commit message
        commit_message: String,
    },
}

/// Publish/subscribe fan-out to connected clients
#[async_trait]
pub trait RealtimeBus: Send + Sync {
    /// Publish an event on a channel
    ///
    /// Implementations should return quickly; slow subscribers must not
    /// stall the caller.
    async fn publish(&self, channel: &str, event: BusEvent) -> Result<(), BusError>;
}
