//! Stream sequencer
//!
//! Wraps one generation/evaluation run and guarantees:
//! - sequence numbers are contiguous from 1, regardless of upstream hints
//! - every event becomes exactly one message, synchronously, in arrival order
//! - the realtime bus is notified before the store write is awaited
//! - persistence is idempotent by message id and serialized per session
//!
//! A gap in the upstream hint stream is a logged anomaly, not a fatal error:
//! one dropped event must not abort an otherwise-successful run.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::bus::{BusEvent, RealtimeBus};
use crate::event::{StreamEvent, TokenUsage};
use crate::message::ConversationMessage;
use crate::store::PersistenceQueue;

/// Assigns ordering to one run's event feed and externalizes progress
pub struct StreamSequencer {
    session_id: String,
    channel: String,
    iteration: u32,
    next_seq: u64,
    last_upstream: Option<u64>,
    usage: TokenUsage,
    bus: Arc<dyn RealtimeBus>,
    queue: PersistenceQueue,
}

impl StreamSequencer {
    /// Create a sequencer for one run
    ///
    /// `channel` is the realtime fan-out target (the original system used
    /// one room per project).
    #[must_use]
    pub fn new(
        bus: Arc<dyn RealtimeBus>,
        queue: PersistenceQueue,
        session_id: impl Into<String>,
        channel: impl Into<String>,
        iteration: u32,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            channel: channel.into(),
            iteration,
            next_seq: 1,
            last_upstream: None,
            usage: TokenUsage::default(),
            bus,
            queue,
        }
    }

    /// Consume events from a run until the channel closes
    ///
    /// Returns the number of events processed. Event N+1 is not touched
    /// before event N's message has been emitted and enqueued.
    pub async fn drive(&mut self, mut events: mpsc::Receiver<StreamEvent>) -> u64 {
        let mut processed = 0;
        while let Some(event) = events.recv().await {
            self.process(&event).await;
            processed += 1;
        }
        processed
    }

    /// Sequence one event: number it, convert it, emit it, enqueue it
    pub async fn process(&mut self, event: &StreamEvent) -> ConversationMessage {
        let sequence = self.next_seq;
        self.next_seq += 1;

        self.check_for_gap(event, sequence);

        if let Some(usage) = event.usage {
            self.usage.merge(usage);
        }

        let message =
            ConversationMessage::from_event(&self.session_id, self.iteration, sequence, event);

        // Transport first: live subscribers must never lag behind the store
        self.publish(BusEvent::ConversationMessage {
            message: message.clone(),
        })
        .await;

        self.queue.enqueue(message.clone());
        message
    }

    /// Persist and announce a user-submitted prompt
    ///
    /// User messages carry no sequence number; idempotency comes from the
    /// client-supplied id when present.
    pub async fn record_user_prompt(
        &self,
        content: impl Into<String>,
        client_id: Option<String>,
    ) -> ConversationMessage {
        let message = ConversationMessage::user_input(&self.session_id, content, client_id);

        self.publish(BusEvent::ConversationMessage {
            message: message.clone(),
        })
        .await;

        self.queue.enqueue(message.clone());
        message
    }

    /// Publish a non-message event (validation errors, diff creation)
    pub async fn publish(&self, event: BusEvent) {
        if let Err(e) = self.bus.publish(&self.channel, event).await {
            // The realtime channel is a convenience, not a correctness
            // dependency
            tracing::warn!(channel = %self.channel, error = %e, "realtime publish failed");
        }
    }

    /// Total usage accumulated from events so far
    #[inline]
    #[must_use]
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Number of events sequenced so far
    #[inline]
    #[must_use]
    pub fn events_processed(&self) -> u64 {
        self.next_seq - 1
    }

    fn check_for_gap(&mut self, event: &StreamEvent, assigned: u64) {
        if let Some(hint) = event.upstream_seq {
            if let Some(last) = self.last_upstream {
                if hint != last + 1 {
                    tracing::warn!(
                        session_id = %self.session_id,
                        expected = last + 1,
                        got = hint,
                        assigned,
                        "event sequence gap detected"
                    );
                }
            }
            self.last_upstream = Some(hint);
        }
    }
}
