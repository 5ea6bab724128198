//! Patchflow Workflow - generator/evaluator orchestration and diff lifecycle
//!
//! The coordination layer of the patch workflow:
//! - Drives the bounded Generate -> Validate -> Evaluate retry loop
//! - Persists evaluator-approved patches as reviewable diff records
//! - Advances diffs through human review and optimistic commit
//!
//! # Example
//!
//! ```rust,ignore
//! use patchflow_workflow::{WorkflowConfig, WorkflowOrchestrator, WorkflowRequest};
//!
//! # async fn example(orchestrator: WorkflowOrchestrator) {
//! let outcome = orchestrator
//!     .run(WorkflowRequest {
//!         session_id: "session-1".into(),
//!         target: "main.py".into(),
//!         channel: "project_demo".into(),
//!         prompt: "add a docstring".into(),
//!         current_code: "def hello():\n    return 'world'\n".into(),
//!     })
//!     .await;
//! # let _ = outcome;
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod capability;
pub mod config;
pub mod diff_record;
pub mod diff_store;
pub mod error;
pub mod lifecycle;
pub mod orchestrator;
pub mod version_store;

// Re-exports for convenience
pub use capability::{
    CapabilityError, EvaluateRequest, EvaluationVerdict, Evaluator, GenerateRequest, Generator,
    GeneratorReply,
};
pub use config::WorkflowConfig;
pub use diff_record::{Diff, DiffStatus};
pub use diff_store::DiffStore;
pub use error::{LifecycleError, StorageError, WorkflowError};
pub use lifecycle::DiffLifecycle;
pub use orchestrator::{
    rejection_followup_prompt, WorkflowOrchestrator, WorkflowOutcome, WorkflowRequest,
};
pub use version_store::VersionStore;
