//! Workflow orchestrator
//!
//! The bounded-retry state machine at the center of the system:
//! Generating -> Validating -> Evaluating -> approved | retry | exhausted.
//! Each run owns its own iteration counter and feedback string; nothing is
//! shared across sessions, and generator/evaluator calls within a run are
//! strictly sequential.

use std::sync::Arc;

use tokio::sync::mpsc;

use patchflow_diff::{PatchValidator, ValidationResult};
use patchflow_stream::{
    BusEvent, MessageStore, PersistenceQueue, RealtimeBus, StreamSequencer, TokenUsage,
};

use crate::capability::{
    EvaluateRequest, EvaluationVerdict, Evaluator, GenerateRequest, Generator, GeneratorReply,
};
use crate::config::WorkflowConfig;
use crate::diff_record::Diff;
use crate::diff_store::DiffStore;
use crate::error::WorkflowError;
use crate::version_store::VersionStore;

/// Input to one orchestrator run
#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    /// Owning session
    pub session_id: String,
    /// Version-store target the change is against
    pub target: String,
    /// Realtime channel for this run's progress
    pub channel: String,
    /// The user's request
    pub prompt: String,
    /// Code the patch must apply to
    pub current_code: String,
}

/// Terminal result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// The generator answered in prose; no patch was proposed
    TextAnswer {
        /// Answer content
        content: String,
        /// Total token usage across the run
        usage: TokenUsage,
    },
    /// The evaluator approved a patch; a diff awaits human review
    DiffCreated {
        /// Id of the persisted diff record
        diff_id: String,
        /// The approved unified diff text
        patch: String,
        /// Total token usage across the run
        usage: TokenUsage,
    },
}

/// Drives generator, validator and evaluator to a terminal result
pub struct WorkflowOrchestrator {
    config: WorkflowConfig,
    validator: PatchValidator,
    generator: Arc<dyn Generator>,
    evaluator: Arc<dyn Evaluator>,
    bus: Arc<dyn RealtimeBus>,
    messages: Arc<dyn MessageStore>,
    diffs: Arc<dyn DiffStore>,
    versions: Arc<dyn VersionStore>,
}

impl WorkflowOrchestrator {
    /// Wire up an orchestrator from its collaborators
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: WorkflowConfig,
        validator: PatchValidator,
        generator: Arc<dyn Generator>,
        evaluator: Arc<dyn Evaluator>,
        bus: Arc<dyn RealtimeBus>,
        messages: Arc<dyn MessageStore>,
        diffs: Arc<dyn DiffStore>,
        versions: Arc<dyn VersionStore>,
    ) -> Self {
        Self {
            config,
            validator,
            generator,
            evaluator,
            bus,
            messages,
            diffs,
            versions,
        }
    }

    /// Run the full generate/validate/evaluate loop for one request
    ///
    /// # Errors
    /// - [`WorkflowError::IterationExhausted`] when the bound is reached
    ///   without approval; never coerced into a text answer
    /// - [`WorkflowError::Capability`] when a role implementation fails
    /// - [`WorkflowError::Storage`] when a store seam fails
    pub async fn run(&self, request: WorkflowRequest) -> Result<WorkflowOutcome, WorkflowError> {
        // Head at generation start; commit-time staleness is judged against
        // this exact value
        let base_version = self.versions.head_of(&request.target).await?;
        let queue = PersistenceQueue::spawn(self.messages.clone());

        let mut usage = TokenUsage::default();
        let mut feedback: Option<String> = None;

        for iteration in 0..self.config.max_iterations {
            tracing::info!(
                session_id = %request.session_id,
                iteration = iteration + 1,
                "running generator"
            );

            let mut sequencer = StreamSequencer::new(
                self.bus.clone(),
                queue.clone(),
                &request.session_id,
                &request.channel,
                iteration,
            );

            let generate = GenerateRequest {
                prompt: request.prompt.clone(),
                current_code: request.current_code.clone(),
                feedback: feedback.take(),
            };
            let reply = self.invoke_generator(&mut sequencer, generate).await?;
            usage.merge(sequencer.usage());

            let (patch, description) = match reply {
                GeneratorReply::Text { content } => {
                    tracing::info!(session_id = %request.session_id, "generator answered in text");
                    return Ok(WorkflowOutcome::TextAnswer { content, usage });
                }
                GeneratorReply::Patch { patch, description } => (patch, description),
            };

            let patched_code =
                match self.validator.validate(&request.current_code, &patch) {
                    ValidationResult {
                        valid: true,
                        patched_text: Some(text),
                        ..
                    } => text,
                    ValidationResult { error, .. } => {
                        let error = error
                            .unwrap_or_else(|| "validation produced no diagnostic".to_string());
                        tracing::warn!(
                            session_id = %request.session_id,
                            iteration = iteration + 1,
                            error = %error,
                            "patch failed validation"
                        );
                        sequencer
                            .publish(BusEvent::ValidationError {
                                session_id: request.session_id.clone(),
                                iteration,
                                error: error.clone(),
                            })
                            .await;
                        feedback =
                            Some(format!("Previous patch had a validation error: {error}"));
                        continue;
                    }
                };

            tracing::info!(
                session_id = %request.session_id,
                iteration = iteration + 1,
                "running evaluator"
            );
            let mut eval_sequencer = StreamSequencer::new(
                self.bus.clone(),
                queue.clone(),
                &request.session_id,
                &request.channel,
                iteration,
            );
            let evaluate = EvaluateRequest {
                original_code: request.current_code.clone(),
                patched_code,
                description,
                prompt: request.prompt.clone(),
            };
            let verdict = self.invoke_evaluator(&mut eval_sequencer, evaluate).await?;
            usage.merge(eval_sequencer.usage());

            if verdict.approved {
                return self
                    .record_approval(&request, base_version, patch, verdict, &sequencer, usage)
                    .await;
            }

            tracing::info!(
                session_id = %request.session_id,
                iteration = iteration + 1,
                "evaluator rejected the patch, iterating with feedback"
            );
            feedback = Some(format!(
                "The evaluator rejected your patch. Feedback: {}",
                verdict.reasoning
            ));
        }

        tracing::warn!(
            session_id = %request.session_id,
            attempts = self.config.max_iterations,
            "iteration limit reached without approval"
        );
        Err(WorkflowError::IterationExhausted {
            attempts: self.config.max_iterations,
        })
    }

    async fn invoke_generator(
        &self,
        sequencer: &mut StreamSequencer,
        request: GenerateRequest,
    ) -> Result<GeneratorReply, WorkflowError> {
        let (tx, rx) = mpsc::channel(self.config.event_capacity);
        let (reply, _events) =
            tokio::join!(self.generator.generate(request, tx), sequencer.drive(rx));
        Ok(reply?)
    }

    async fn invoke_evaluator(
        &self,
        sequencer: &mut StreamSequencer,
        request: EvaluateRequest,
    ) -> Result<EvaluationVerdict, WorkflowError> {
        let (tx, rx) = mpsc::channel(self.config.event_capacity);
        let (verdict, _events) =
            tokio::join!(self.evaluator.evaluate(request, tx), sequencer.drive(rx));
        Ok(verdict?)
    }

    async fn record_approval(
        &self,
        request: &WorkflowRequest,
        base_version: Option<String>,
        patch: String,
        verdict: EvaluationVerdict,
        sequencer: &StreamSequencer,
        usage: TokenUsage,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let diff = Diff::evaluator_approved(
            &request.session_id,
            &request.target,
            base_version,
            &patch,
            verdict.reasoning,
            verdict.commit_message.clone(),
        );
        self.diffs.insert(diff.clone()).await?;

        tracing::info!(diff_id = %diff.id, "diff approved and saved");

        sequencer
            .publish(BusEvent::DiffCreated {
                diff_id: diff.id.clone(),
                session_id: request.session_id.clone(),
                commit_message: verdict.commit_message,
            })
            .await;

        Ok(WorkflowOutcome::DiffCreated {
            diff_id: diff.id,
            patch,
            usage,
        })
    }
}

/// Build the retry prompt used after a human rejects a diff
///
/// A human rejection terminates the rejected diff; the retry is a brand-new
/// run whose prompt carries the feedback and the original request.
#[must_use]
pub fn rejection_followup_prompt(feedback: &str, initial_prompt: &str) -> String {
    format!(
        "The previous patch was rejected with this feedback:\n{feedback}\n\n\
         Please create a new patch that addresses this feedback.\n\n\
         Original request: {initial_prompt}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_prompt_carries_feedback_and_request() {
        let prompt = rejection_followup_prompt("too invasive", "add logging");
        assert!(prompt.contains("too invasive"));
        assert!(prompt.contains("Original request: add logging"));
    }
}
