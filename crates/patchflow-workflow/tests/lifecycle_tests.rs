//! Review and commit flows over persisted diffs

use std::sync::Arc;

use pretty_assertions::assert_eq;

use patchflow_test_utils::{init_tracing, MemoryDiffStore, MemoryVersionStore};
use patchflow_workflow::{
    Diff, DiffLifecycle, DiffStatus, DiffStore, LifecycleError, VersionStore,
};

const CODE: &str = "def hello():\n    return 'world'\n";
const COMMENT_PATCH: &str = "@@ -1,2 +1,3 @@\n+# comment\n def hello():\n     return 'world'\n";

struct Fixture {
    diffs: Arc<MemoryDiffStore>,
    versions: Arc<MemoryVersionStore>,
    lifecycle: DiffLifecycle,
    base: String,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        let diffs = Arc::new(MemoryDiffStore::new());
        let versions = Arc::new(MemoryVersionStore::new());
        let base = versions.seed("main.py", CODE);
        let lifecycle = DiffLifecycle::new(diffs.clone(), versions.clone());
        Self {
            diffs,
            versions,
            lifecycle,
            base,
        }
    }

    async fn insert_approved(&self, patch: &str) -> String {
        let diff = Diff::evaluator_approved(
            "s1",
            "main.py",
            Some(self.base.clone()),
            patch,
            "looks correct",
            "docs: comment hello",
        );
        let id = diff.id.clone();
        self.diffs.insert(diff).await.unwrap();
        id
    }
}

#[tokio::test]
async fn approve_then_commit_advances_the_head() {
    let f = Fixture::new();
    let id = f.insert_approved(COMMENT_PATCH).await;

    let reviewed = f.lifecycle.review(&id, true, None).await.unwrap();
    assert_eq!(reviewed.status, DiffStatus::HumanApproved);

    let committed = f.lifecycle.commit(&id, None).await.unwrap();
    assert_eq!(committed.status, DiffStatus::Committed);
    let version = committed.committed_version.unwrap();
    assert_eq!(version.len(), 40);
    assert!(version.chars().all(|c| c.is_ascii_hexdigit()));

    assert_eq!(f.versions.version_count("main.py"), 2);
    let text = f.versions.current_text("main.py").await.unwrap();
    assert_eq!(text, "# comment\ndef hello():\n    return 'world'\n");
}

#[tokio::test]
async fn second_commit_is_an_invalid_state() {
    let f = Fixture::new();
    let id = f.insert_approved(COMMENT_PATCH).await;
    f.lifecycle.review(&id, true, None).await.unwrap();
    f.lifecycle.commit(&id, None).await.unwrap();

    let err = f.lifecycle.commit(&id, None).await.unwrap_err();
    assert!(
        matches!(
            err,
            LifecycleError::InvalidState {
                expected: DiffStatus::HumanApproved,
                actual: DiffStatus::Committed,
                ..
            }
        ),
        "got: {err:?}"
    );
    // No second version was written
    assert_eq!(f.versions.version_count("main.py"), 2);
}

#[tokio::test]
async fn rejection_is_terminal_and_keeps_feedback() {
    let f = Fixture::new();
    let id = f.insert_approved(COMMENT_PATCH).await;

    let rejected = f
        .lifecycle
        .review(&id, false, Some("comment adds nothing".to_string()))
        .await
        .unwrap();
    assert_eq!(rejected.status, DiffStatus::HumanRejected);
    assert_eq!(rejected.human_feedback.as_deref(), Some("comment adds nothing"));
    assert!(rejected.is_terminal());

    // Neither a second review nor a commit can move it
    let err = f.lifecycle.review(&id, true, None).await.unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidState { .. }));
    let err = f.lifecycle.commit(&id, None).await.unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidState { .. }));
    assert_eq!(f.versions.version_count("main.py"), 1);
}

#[tokio::test]
async fn commit_before_review_has_no_side_effects() {
    let f = Fixture::new();
    let id = f.insert_approved(COMMENT_PATCH).await;

    let err = f.lifecycle.commit(&id, None).await.unwrap_err();
    assert!(
        matches!(
            err,
            LifecycleError::InvalidState {
                expected: DiffStatus::HumanApproved,
                actual: DiffStatus::EvaluatorApproved,
                ..
            }
        ),
        "got: {err:?}"
    );

    let diff = f.diffs.get(&id).await.unwrap().unwrap();
    assert_eq!(diff.status, DiffStatus::EvaluatorApproved);
    assert_eq!(diff.committed_version, None);
    assert_eq!(f.versions.version_count("main.py"), 1);
}

#[tokio::test]
async fn unknown_diff_is_not_found() {
    let f = Fixture::new();
    let err = f.lifecycle.review("no-such-diff", true, None).await.unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(_)), "got: {err:?}");
}

#[tokio::test]
async fn concurrent_commit_loses_with_stale_base() {
    let f = Fixture::new();
    // Two diffs generated against the same base; both patches insert at the
    // top without context, so the second still applies after the first lands
    let first = f.insert_approved("@@ -0,0 +1,1 @@\n+# one\n").await;
    let second = f.insert_approved("@@ -0,0 +1,1 @@\n+# two\n").await;
    f.lifecycle.review(&first, true, None).await.unwrap();
    f.lifecycle.review(&second, true, None).await.unwrap();

    f.lifecycle.commit(&first, None).await.unwrap();
    let new_head = f.versions.head_of("main.py").await.unwrap();

    let err = f.lifecycle.commit(&second, None).await.unwrap_err();
    match err {
        LifecycleError::StaleBaseVersion { expected, actual } => {
            assert_eq!(expected, Some(f.base.clone()));
            assert_eq!(actual, new_head);
        }
        other => panic!("expected stale base, got {other:?}"),
    }

    // The loser is untouched and can be retried after regeneration
    let diff = f.diffs.get(&second).await.unwrap().unwrap();
    assert_eq!(diff.status, DiffStatus::HumanApproved);
    assert_eq!(f.versions.version_count("main.py"), 2);
}

#[tokio::test]
async fn conflicting_commit_reports_stale_base_not_patch_apply() {
    let f = Fixture::new();
    // Both patches rewrite the same def line, so the winner's commit also
    // breaks the loser's context; the loser must still see the lost race
    let first = f
        .insert_approved(
            "@@ -1,2 +1,2 @@\n-def hello():\n+def hello():  # a\n     return 'world'\n",
        )
        .await;
    let second = f
        .insert_approved(
            "@@ -1,2 +1,2 @@\n-def hello():\n+def hello():  # b\n     return 'world'\n",
        )
        .await;
    f.lifecycle.review(&first, true, None).await.unwrap();
    f.lifecycle.review(&second, true, None).await.unwrap();

    f.lifecycle.commit(&first, None).await.unwrap();

    let err = f.lifecycle.commit(&second, None).await.unwrap_err();
    assert!(
        matches!(err, LifecycleError::StaleBaseVersion { .. }),
        "got: {err:?}"
    );

    let diff = f.diffs.get(&second).await.unwrap().unwrap();
    assert_eq!(diff.status, DiffStatus::HumanApproved);
    assert_eq!(f.versions.version_count("main.py"), 2);
}

#[tokio::test]
async fn undrifted_patch_that_no_longer_applies_is_a_patch_error() {
    let f = Fixture::new();
    // Context names a line the target never had
    let id = f
        .insert_approved("@@ -1,2 +1,2 @@\n def goodbye():\n-    return 0\n+    return 1\n")
        .await;
    f.lifecycle.review(&id, true, None).await.unwrap();

    let err = f.lifecycle.commit(&id, None).await.unwrap_err();
    assert!(matches!(err, LifecycleError::PatchApply(_)), "got: {err:?}");

    let diff = f.diffs.get(&id).await.unwrap().unwrap();
    assert_eq!(diff.status, DiffStatus::HumanApproved);
    assert_eq!(f.versions.version_count("main.py"), 1);
}

#[tokio::test]
async fn commit_message_override_wins() {
    let f = Fixture::new();
    let id = f.insert_approved(COMMENT_PATCH).await;
    f.lifecycle.review(&id, true, None).await.unwrap();

    let committed = f
        .lifecycle
        .commit(&id, Some("docs: hand-written message".to_string()))
        .await
        .unwrap();
    assert_eq!(committed.status, DiffStatus::Committed);
    assert!(committed.committed_version.is_some());
}
