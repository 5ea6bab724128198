//! Testing utilities for the Patchflow workspace
//!
//! Scripted capability doubles, in-memory stores, and a recording bus.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;

use patchflow_stream::{
    BusError, BusEvent, ConversationMessage, MessageStore, RealtimeBus, StoreError, StreamEvent,
};
use patchflow_workflow::{
    CapabilityError, Diff, DiffStore, EvaluateRequest, EvaluationVerdict, Evaluator,
    GenerateRequest, Generator, GeneratorReply, StorageError, VersionStore,
};

/// One canned generator turn: events to emit, then the reply to return.
#[derive(Debug, Clone)]
pub struct GeneratorStep {
    pub events: Vec<StreamEvent>,
    pub reply: GeneratorReply,
}

/// Generator double that replays canned steps and records every request.
#[derive(Default)]
pub struct ScriptedGenerator {
    steps: Mutex<VecDeque<GeneratorStep>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_step(&self, step: GeneratorStep) {
        self.steps.lock().push_back(step);
    }

    pub fn push_text(&self, content: &str) {
        self.push_step(GeneratorStep {
            events: vec![StreamEvent::text(content)],
            reply: GeneratorReply::Text {
                content: content.to_string(),
            },
        });
    }

    pub fn push_patch(&self, patch: &str, description: &str) {
        self.push_step(GeneratorStep {
            events: vec![
                StreamEvent::text(description),
                StreamEvent::tool_invoked("submit_patch", serde_json::json!({ "patch": patch })),
            ],
            reply: GeneratorReply::Patch {
                patch: patch.to_string(),
                description: description.to_string(),
            },
        });
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        request: GenerateRequest,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<GeneratorReply, CapabilityError> {
        self.requests.lock().push(request);
        let step = self
            .steps
            .lock()
            .pop_front()
            .ok_or_else(|| CapabilityError::Generator("no scripted reply left".to_string()))?;
        for event in step.events {
            let _ = events.send(event).await;
        }
        Ok(step.reply)
    }
}

/// Evaluator double that replays canned verdicts and records every request.
#[derive(Default)]
pub struct ScriptedEvaluator {
    verdicts: Mutex<VecDeque<EvaluationVerdict>>,
    requests: Mutex<Vec<EvaluateRequest>>,
}

impl ScriptedEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_verdict(&self, approved: bool, reasoning: &str, commit_message: &str) {
        self.verdicts.lock().push_back(EvaluationVerdict {
            approved,
            reasoning: reasoning.to_string(),
            commit_message: commit_message.to_string(),
        });
    }

    pub fn requests(&self) -> Vec<EvaluateRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    async fn evaluate(
        &self,
        request: EvaluateRequest,
        _events: mpsc::Sender<StreamEvent>,
    ) -> Result<EvaluationVerdict, CapabilityError> {
        self.requests.lock().push(request);
        self.verdicts
            .lock()
            .pop_front()
            .ok_or_else(|| CapabilityError::Evaluator("no scripted verdict left".to_string()))
    }
}

/// In-memory message store with first-write-wins upsert semantics.
#[derive(Default)]
pub struct MemoryMessageStore {
    messages: DashMap<String, ConversationMessage>,
    order: Mutex<Vec<String>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored messages in the order their first write arrived.
    pub fn all(&self) -> Vec<ConversationMessage> {
        let order = self.order.lock();
        order
            .iter()
            .filter_map(|id| self.messages.get(id).map(|m| m.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn upsert(&self, message: ConversationMessage) -> Result<(), StoreError> {
        if self.messages.contains_key(&message.id) {
            return Ok(());
        }
        self.order.lock().push(message.id.clone());
        self.messages.insert(message.id.clone(), message);
        Ok(())
    }
}

/// Bus double that records every published event.
#[derive(Default)]
pub struct RecordingBus {
    events: Mutex<Vec<(String, BusEvent)>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(channel, event)` pairs in publish order.
    pub fn events(&self) -> Vec<(String, BusEvent)> {
        self.events.lock().clone()
    }

    pub fn events_on(&self, channel: &str) -> Vec<BusEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[async_trait]
impl RealtimeBus for RecordingBus {
    async fn publish(&self, channel: &str, event: BusEvent) -> Result<(), BusError> {
        self.events.lock().push((channel.to_string(), event));
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct VersionEntry {
    id: String,
    content: String,
}

/// In-memory append-only version store with git-like 40-char hex ids.
#[derive(Default)]
pub struct MemoryVersionStore {
    targets: DashMap<String, Vec<VersionEntry>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write initial content for a target, returning the seed version id.
    pub fn seed(&self, target: &str, content: &str) -> String {
        let id = version_id(None, content, "seed");
        self.targets.entry(target.to_string()).or_default().push(VersionEntry {
            id: id.clone(),
            content: content.to_string(),
        });
        id
    }

    pub fn version_count(&self, target: &str) -> usize {
        self.targets.get(target).map_or(0, |v| v.len())
    }
}

fn version_id(parent: Option<&str>, content: &str, message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parent.unwrap_or("").as_bytes());
    hasher.update(content.as_bytes());
    hasher.update(message.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..20])
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn head_of(&self, target: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .targets
            .get(target)
            .and_then(|v| v.last().map(|e| e.id.clone())))
    }

    async fn current_text(&self, target: &str) -> Result<String, StorageError> {
        self.targets
            .get(target)
            .and_then(|v| v.last().map(|e| e.content.clone()))
            .ok_or_else(|| StorageError::UnknownTarget(target.to_string()))
    }

    async fn write(
        &self,
        target: &str,
        content: &str,
        message: &str,
    ) -> Result<String, StorageError> {
        let mut entry = self.targets.entry(target.to_string()).or_default();
        let parent = entry.last().map(|e| e.id.clone());
        let id = version_id(parent.as_deref(), content, message);
        entry.push(VersionEntry {
            id: id.clone(),
            content: content.to_string(),
        });
        Ok(id)
    }
}

/// In-memory diff store.
#[derive(Default)]
pub struct MemoryDiffStore {
    diffs: DashMap<String, Diff>,
}

impl MemoryDiffStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.diffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// Every stored diff, unordered.
    pub fn all(&self) -> Vec<Diff> {
        self.diffs.iter().map(|d| d.clone()).collect()
    }
}

#[async_trait]
impl DiffStore for MemoryDiffStore {
    async fn insert(&self, diff: Diff) -> Result<(), StorageError> {
        if self.diffs.contains_key(&diff.id) {
            return Err(StorageError::Backend(format!(
                "duplicate diff id: {}",
                diff.id
            )));
        }
        self.diffs.insert(diff.id.clone(), diff);
        Ok(())
    }

    async fn get(&self, diff_id: &str) -> Result<Option<Diff>, StorageError> {
        Ok(self.diffs.get(diff_id).map(|d| d.clone()))
    }

    async fn update(&self, diff: Diff) -> Result<(), StorageError> {
        if !self.diffs.contains_key(&diff.id) {
            return Err(StorageError::Backend(format!(
                "cannot update unknown diff: {}",
                diff.id
            )));
        }
        self.diffs.insert(diff.id.clone(), diff);
        Ok(())
    }
}

/// Install a tracing subscriber once for the whole test binary.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Convenience bundle wiring an orchestrator's collaborators together.
pub struct Harness {
    pub generator: Arc<ScriptedGenerator>,
    pub evaluator: Arc<ScriptedEvaluator>,
    pub bus: Arc<RecordingBus>,
    pub messages: Arc<MemoryMessageStore>,
    pub diffs: Arc<MemoryDiffStore>,
    pub versions: Arc<MemoryVersionStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            generator: Arc::new(ScriptedGenerator::new()),
            evaluator: Arc::new(ScriptedEvaluator::new()),
            bus: Arc::new(RecordingBus::new()),
            messages: Arc::new(MemoryMessageStore::new()),
            diffs: Arc::new(MemoryDiffStore::new()),
            versions: Arc::new(MemoryVersionStore::new()),
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
