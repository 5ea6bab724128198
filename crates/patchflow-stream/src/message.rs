//! Persisted conversation messages
//!
//! A `ConversationMessage` is the durable projection of a stream event (or
//! of a user-submitted prompt). Ids are globally unique; writes are
//! idempotent by id, which is the sole deduplication mechanism across
//! client- and server-originated messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{EventPayload, StreamEvent, TokenUsage};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Human user
    User,
    /// Generator or evaluator agent
    Assistant,
    /// System-originated notice
    System,
}

/// What kind of record this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A prompt submitted by the user
    UserInput,
    /// The projection of one stream event
    StreamEvent,
}

/// The persisted projection of a stream event or user prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Globally unique id; client-suppliable for idempotent resubmission
    pub id: String,
    /// Owning session
    pub session_id: String,
    /// Message author role
    pub role: Role,
    /// Record kind
    pub kind: MessageKind,
    /// Per-run contiguous ordinal; `None` for user messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    /// Workflow iteration the message belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,
    /// Display content (text chunks, user prompt text)
    pub content: String,
    /// Stream event kind discriminator, for stream-event records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// Tool invocations captured by this message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<serde_json::Value>,
    /// Tool outputs captured by this message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_outputs: Option<serde_json::Value>,
    /// Agent handoff details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoffs: Option<serde_json::Value>,
    /// Token usage attributable to this message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ConversationMessage {
    /// Project a stream event into its persisted form
    #[must_use]
    pub fn from_event(
        session_id: &str,
        iteration: u32,
        sequence: u64,
        event: &StreamEvent,
    ) -> Self {
        let now = Utc::now();
        let mut message = Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            role: Role::Assistant,
            kind: MessageKind::StreamEvent,
            sequence: Some(sequence),
            iteration: Some(iteration),
            content: String::new(),
            event_type: Some(event.payload.kind().to_string()),
            tool_calls: None,
            tool_outputs: None,
            handoffs: None,
            usage: event.usage,
            created_at: now,
            updated_at: now,
        };

        match &event.payload {
            EventPayload::TextChunk { text } => {
                message.content = text.clone();
            }
            EventPayload::ToolInvoked { tool, arguments } => {
                message.tool_calls = Some(serde_json::json!([{
                    "tool": tool,
                    "arguments": arguments,
                }]));
            }
            EventPayload::ToolResult { tool, output } => {
                message.tool_outputs = Some(serde_json::json!([{
                    "tool": tool,
                    "output": output,
                }]));
            }
            EventPayload::AgentSwitched { agent } => {
                message.handoffs = Some(serde_json::json!([{ "agent": agent }]));
            }
        }

        message
    }

    /// Build the record for a user-submitted prompt
    ///
    /// A client may supply its own id; resubmitting with the same id is a
    /// no-op at the store. Without one, a fresh UUID is generated.
    #[must_use]
    pub fn user_input(
        session_id: &str,
        content: impl Into<String>,
        client_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: client_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            session_id: session_id.to_string(),
            role: Role::User,
            kind: MessageKind::UserInput,
            sequence: None,
            iteration: None,
            content: content.into(),
            event_type: None,
            tool_calls: None,
            tool_outputs: None,
            handoffs: None,
            usage: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_event_projects_text_chunk() {
        let event = StreamEvent::text("hello");
        let message = ConversationMessage::from_event("s1", 0, 3, &event);
        assert_eq!(message.content, "hello");
        assert_eq!(message.sequence, Some(3));
        assert_eq!(message.event_type.as_deref(), Some("text_chunk"));
        assert_eq!(message.role, Role::Assistant);
    }

    #[test]
    fn from_event_projects_tool_call() {
        let event = StreamEvent::tool_invoked("submit_patch", serde_json::json!({"a": 1}));
        let message = ConversationMessage::from_event("s1", 1, 1, &event);
        let calls = message.tool_calls.unwrap();
        assert_eq!(calls[0]["tool"], "submit_patch");
        assert!(message.content.is_empty());
    }

    #[test]
    fn from_event_projects_handoff() {
        let event = StreamEvent::agent_switched("evaluator");
        let message = ConversationMessage::from_event("s1", 0, 2, &event);
        assert_eq!(message.handoffs.unwrap()[0]["agent"], "evaluator");
    }

    #[test]
    fn user_input_honors_client_id() {
        let message =
            ConversationMessage::user_input("s1", "do it", Some("client-123".to_string()));
        assert_eq!(message.id, "client-123");
        assert_eq!(message.sequence, None);
        assert_eq!(message.kind, MessageKind::UserInput);
    }

    #[test]
    fn user_input_generates_unique_ids() {
        let a = ConversationMessage::user_input("s1", "x", None);
        let b = ConversationMessage::user_input("s1", "x", None);
        assert_ne!(a.id, b.id);
    }
}
