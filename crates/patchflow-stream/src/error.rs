//! Error types for the streaming layer

/// Message store failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Backend rejected or failed the write
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Realtime transport failures
///
/// These are logged and swallowed by the sequencer; the realtime channel is
/// a convenience, not a correctness dependency.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BusError {
    /// Publish could not be delivered
    #[error("publish failed: {0}")]
    PublishFailed(String),

    /// Transport is shut down
    #[error("transport closed")]
    Closed,
}
