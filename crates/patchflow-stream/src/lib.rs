//! Patchflow Stream - ordered event sequencing and message persistence
//!
//! Converts the asynchronous event feed of a generator/evaluator run into an
//! ordered, deduplicated, persisted conversation log that is fanned out to
//! realtime subscribers as it happens:
//! - Tagged stream event model with per-kind payloads
//! - Contiguous 1-based sequence numbering per run
//! - Emit-before-persist ordering with a per-session write queue
//! - Idempotent message storage keyed by globally unique ids

#![warn(unreachable_pub)]

pub mod bus;
pub mod error;
pub mod event;
pub mod message;
pub mod sequencer;
pub mod store;

// Re-exports for convenience
pub use bus::{BusEvent, RealtimeBus};
pub use error::{BusError, StoreError};
pub use event::{EventPayload, StreamEvent, TokenUsage};
pub use message::{ConversationMessage, MessageKind, Role};
pub use sequencer::StreamSequencer;
pub use store::{MessageStore, PersistenceQueue};
