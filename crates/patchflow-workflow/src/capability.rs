//! Generator and evaluator capability seams
//!
//! The two AI roles this core coordinates are abstract: a generator turns a
//! prompt plus current code into either a plain-text answer or a patch
//! proposal, and an evaluator cross-checks a validated patch. Both may emit
//! stream events through the provided channel while running; the
//! orchestrator sequences those concurrently with awaiting the reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use patchflow_stream::StreamEvent;

/// Input to one generator invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The user's request (or a retry prompt built from feedback)
    pub prompt: String,
    /// Code the patch must apply to
    pub current_code: String,
    /// Feedback from a failed prior iteration, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// What the generator produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneratorReply {
    /// Plain-text answer; terminal, no patch workflow follows
    Text {
        /// Answer content
        content: String,
    },
    /// A proposed unified-diff patch
    Patch {
        /// Unified diff text
        patch: String,
        /// Natural-language description of the change
        description: String,
    },
}

/// Input to one evaluator invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluateRequest {
    /// Code before the patch
    pub original_code: String,
    /// Code after the patch (already validated as structurally sound)
    pub patched_code: String,
    /// Generator's description of the change
    pub description: String,
    /// The user's original request
    pub prompt: String,
}

/// The evaluator's decision
///
/// `commit_message` is only meaningful when `approved` is true but is always
/// present (possibly empty) to keep the shape uniform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationVerdict {
    /// Whether the patch should move to human review
    pub approved: bool,
    /// The evaluator's reasoning, fed back to the generator on rejection
    pub reasoning: String,
    /// Suggested commit message
    pub commit_message: String,
}

/// Failures inside a capability implementation
#[derive(Debug, Clone, thiserror::Error)]
pub enum CapabilityError {
    /// Generator call failed
    #[error("generator failed: {0}")]
    Generator(String),

    /// Evaluator call failed
    #[error("evaluator failed: {0}")]
    Evaluator(String),
}

/// The code-writing AI role
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a text answer or a patch proposal
    ///
    /// Progress events go through `events`; the sender is dropped when the
    /// call completes, which ends the sequencing loop.
    async fn generate(
        &self,
        request: GenerateRequest,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<GeneratorReply, CapabilityError>;
}

/// The reviewing AI role
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Judge a validated patch
    async fn evaluate(
        &self,
        request: EvaluateRequest,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<EvaluationVerdict, CapabilityError>;
}
