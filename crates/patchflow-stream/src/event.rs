//! Stream events emitted by a generator or evaluator run
//!
//! Events are a tagged union discriminated by kind; each variant carries
//! exactly the fields relevant to that kind. Capabilities push these through
//! an mpsc channel while a run is in flight.

use serde::{Deserialize, Serialize};

/// Kind-specific payload of a stream event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// The active agent changed (generator handed off, evaluator took over)
    AgentSwitched {
        /// Name of the agent now running
        agent: String,
    },
    /// A tool was invoked by the running agent
    ToolInvoked {
        /// Tool name
        tool: String,
        /// Tool arguments as supplied by the agent
        arguments: serde_json::Value,
    },
    /// A tool returned its output
    ToolResult {
        /// Tool name
        tool: String,
        /// Raw tool output
        output: serde_json::Value,
    },
    /// A chunk of assistant text
    TextChunk {
        /// Text content
        text: String,
    },
}

impl EventPayload {
    /// Stable kind discriminator, matching the serde tag
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::AgentSwitched { .. } => "agent_switched",
            EventPayload::ToolInvoked { .. } => "tool_invoked",
            EventPayload::ToolResult { .. } => "tool_result",
            EventPayload::TextChunk { .. } => "text_chunk",
        }
    }
}

/// Token counters reported by the underlying model call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt-side tokens
    pub input_tokens: u64,
    /// Completion-side tokens
    pub output_tokens: u64,
    /// Total tokens billed
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Accumulate another usage report into this one
    pub fn merge(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// One unit of progress from a generation/evaluation run
///
/// `upstream_seq` is the ordering hint the producing capability attached.
/// The sequencer assigns its own contiguous numbering and uses the hint only
/// to detect gaps in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Kind-specific payload
    #[serde(flatten)]
    pub payload: EventPayload,
    /// Ordering hint from the producer, if it carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_seq: Option<u64>,
    /// Token usage attributable to this event, if reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl StreamEvent {
    /// Create an event from a payload, with no hint and no usage
    #[inline]
    #[must_use]
    pub fn new(payload: EventPayload) -> Self {
        Self {
            payload,
            upstream_seq: None,
            usage: None,
        }
    }

    /// Text chunk convenience constructor
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(EventPayload::TextChunk { text: text.into() })
    }

    /// Agent switch convenience constructor
    #[must_use]
    pub fn agent_switched(agent: impl Into<String>) -> Self {
        Self::new(EventPayload::AgentSwitched {
            agent: agent.into(),
        })
    }

    /// Tool invocation convenience constructor
    #[must_use]
    pub fn tool_invoked(tool: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::new(EventPayload::ToolInvoked {
            tool: tool.into(),
            arguments,
        })
    }

    /// Tool result convenience constructor
    #[must_use]
    pub fn tool_result(tool: impl Into<String>, output: serde_json::Value) -> Self {
        Self::new(EventPayload::ToolResult {
            tool: tool.into(),
            output,
        })
    }

    /// Attach an upstream ordering hint
    #[must_use]
    pub fn with_upstream_seq(mut self, seq: u64) -> Self {
        self.upstream_seq = Some(seq);
        self
    }

    /// Attach a token usage report
    #[must_use]
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_kind_matches_serde_tag() {
        let event = StreamEvent::tool_invoked("submit_patch", serde_json::json!({"patch": "x"}));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], event.payload.kind());
    }

    #[test]
    fn usage_merge_accumulates() {
        let mut total = TokenUsage::default();
        total.merge(TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        });
        total.merge(TokenUsage {
            input_tokens: 1,
            output_tokens: 2,
            total_tokens: 3,
        });
        assert_eq!(total.total_tokens, 18);
    }

    #[test]
    fn event_round_trips_through_serde() {
        let event = StreamEvent::agent_switched("evaluator").with_upstream_seq(7);
        let json = serde_json::to_string(&event).unwrap();
        let back: StreamEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
