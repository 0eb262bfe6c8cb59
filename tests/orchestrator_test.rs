//! End-to-end remediation runs against in-memory collaborators.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{
    python_fence, Harness, RecordingPublisher, StaticLogs, BARE_EXCEPT_FIX, ERROR_LOGS, FIXED_APP,
};
use proptest::prelude::*;
use selfheal::adapters::ScriptedModel;
use selfheal::domain::errors::{CollaboratorError, DomainError};
use selfheal::domain::models::{
    AbortReason, PublicationStatus, RunOutcome, RunRequest, Stage, ViolationCategory,
};
use selfheal::domain::ports::{CheckpointStore, ModelReply, PromptKind, ToolCall};
use selfheal::infrastructure::retry::RetryPolicy;
use tokio_util::sync::CancellationToken;

const DIAGNOSIS: &str = "The root cause is a KeyError: 'user_config' is read without a default.";

fn tool_request() -> ModelReply {
    ModelReply::ToolRequest {
        call: ToolCall::FetchLogs {
            window: Some("1h".into()),
            severity: Some("error".into()),
        },
        preamble: "Let me look at the logs.".into(),
    }
}

/// Finds the root cause each pass; the first fix uses a bare except, any
/// fix requested after validation feedback is clean.
fn self_correcting_model() -> ScriptedModel {
    ScriptedModel::from_fn(|prompt, _tools| {
        Ok(match prompt.kind {
            PromptKind::Investigation => tool_request(),
            PromptKind::LogAnalysis => ModelReply::Answer(DIAGNOSIS.into()),
            PromptKind::FixGeneration => {
                if prompt.system.contains("previous fix failed validation") {
                    ModelReply::Answer(python_fence(FIXED_APP))
                } else {
                    ModelReply::Answer(python_fence(BARE_EXCEPT_FIX))
                }
            }
        })
    })
}

fn never_diagnosing_model() -> ScriptedModel {
    ScriptedModel::from_fn(|prompt, _tools| {
        Ok(match prompt.kind {
            PromptKind::Investigation => tool_request(),
            _ => ModelReply::Answer("Nothing conclusive in these lines.".into()),
        })
    })
}

fn assert_terminal_invariants(outcome: &RunOutcome, ceiling: u32) {
    let state = &outcome.state;
    assert!(outcome.terminal.is_terminal());
    assert!(
        state.iteration_count <= ceiling,
        "iteration {} exceeds ceiling {ceiling}",
        state.iteration_count
    );
    if state.publication_status == PublicationStatus::Created {
        assert!(state.fix_validated);
    }
    if state.fix_validated {
        assert!(state.validation_errors.is_empty());
    }
}

#[tokio::test]
async fn test_never_diagnosed_aborts_without_fixing() {
    let harness = Harness::new(
        never_diagnosing_model(),
        StaticLogs::entries(ERROR_LOGS),
        RecordingPublisher::default(),
    );
    let handle = Arc::new(harness.orchestrator(3)).start(
        RunRequest::new("500 on /api/data"),
        CancellationToken::new(),
    );
    let (snapshots, outcome) = handle.finish().await;
    let outcome = outcome.unwrap();

    assert_eq!(
        outcome.terminal,
        Stage::Aborted {
            reason: AbortReason::RootCauseNotFound
        }
    );
    assert_eq!(outcome.state.iteration_count, 3);
    assert!(outcome.state.fix_source.is_empty());
    assert_eq!(snapshots.len(), 3);
    assert!(snapshots
        .iter()
        .all(|s| s.completed == Stage::Investigating));
    assert!(snapshots[2].terminal);

    let calls = harness.model.calls().await;
    assert!(calls.iter().all(|c| c.kind != PromptKind::FixGeneration));
    assert_eq!(harness.logs.call_count(), 3);
    assert!(harness.publisher.requests.lock().await.is_empty());
    assert_terminal_invariants(&outcome, 3);
}

#[tokio::test]
async fn test_failed_validation_loops_back_and_publishes() {
    let harness = Harness::new(
        self_correcting_model(),
        StaticLogs::entries(ERROR_LOGS),
        RecordingPublisher::default(),
    );
    let handle = Arc::new(harness.orchestrator(3)).start(
        RunRequest::new("500 on /api/data").with_session_id("sre-scenario-e"),
        CancellationToken::new(),
    );
    let (snapshots, outcome) = handle.finish().await;
    let outcome = outcome.unwrap();

    let path: Vec<(Stage, Stage)> = snapshots.iter().map(|s| (s.completed, s.next)).collect();
    assert_eq!(
        path,
        vec![
            (Stage::Investigating, Stage::Fixing),
            (Stage::Fixing, Stage::Validating),
            (Stage::Validating, Stage::Investigating),
            (Stage::Investigating, Stage::Fixing),
            (Stage::Fixing, Stage::Validating),
            (Stage::Validating, Stage::Publishing),
            (Stage::Publishing, Stage::Published),
        ]
    );
    assert_eq!(snapshots[2].state.iteration_count, 1);
    assert_eq!(snapshots[3].state.iteration_count, 2);

    assert!(outcome.is_published());
    assert_eq!(outcome.state.iteration_count, 2);
    assert!(outcome.state.fix_validated);
    assert_eq!(outcome.state.fix_source.trim(), FIXED_APP.trim());
    assert_eq!(
        outcome.publication_ref(),
        Some("https://github.example/acme/shop/pull/1")
    );

    // The single failed attempt stays in the history.
    assert_eq!(outcome.state.validation_history.len(), 1);
    let violations = outcome.violations();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].category, ViolationCategory::Lint);

    // Second investigation saw the validation feedback.
    let calls = harness.model.calls().await;
    let investigations: Vec<_> = calls
        .iter()
        .filter(|c| c.kind == PromptKind::Investigation)
        .collect();
    assert_eq!(investigations.len(), 2);
    assert!(!investigations[0].system.contains("previous fix attempt failed"));
    assert!(investigations[1].system.contains("previous fix attempt failed"));
    assert!(investigations[1].system.contains("Bare 'except:'"));

    let requests = harness.publisher.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].title.starts_with("[Automated Fix] The root cause is"));
    assert_eq!(requests[0].target_path, "app.py");
    assert_terminal_invariants(&outcome, 3);
}

#[tokio::test]
async fn test_validation_exhausted_keeps_narrative_and_history() {
    let model = ScriptedModel::from_fn(|prompt, _tools| {
        Ok(match prompt.kind {
            PromptKind::Investigation => tool_request(),
            PromptKind::LogAnalysis => ModelReply::Answer(DIAGNOSIS.into()),
            PromptKind::FixGeneration => ModelReply::Answer(python_fence(BARE_EXCEPT_FIX)),
        })
    });
    let harness = Harness::new(model, StaticLogs::entries(ERROR_LOGS), RecordingPublisher::default());
    let outcome = harness
        .orchestrator(2)
        .run(RunRequest::new("boom"), None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        outcome.terminal,
        Stage::Aborted {
            reason: AbortReason::ValidationExhausted
        }
    );
    assert_eq!(outcome.state.iteration_count, 2);
    assert_eq!(outcome.narrative(), DIAGNOSIS);
    assert_eq!(outcome.state.validation_history.len(), 2);
    assert_eq!(outcome.violations().len(), 2);
    assert!(harness.publisher.requests.lock().await.is_empty());
    assert_terminal_invariants(&outcome, 2);
}

#[tokio::test]
async fn test_empty_logs_consume_iterations() {
    let harness = Harness::new(
        self_correcting_model(),
        StaticLogs::empty(),
        RecordingPublisher::default(),
    );
    let outcome = harness
        .orchestrator(2)
        .run(RunRequest::new("boom"), None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.terminal.abort_reason(), Some(AbortReason::RootCauseNotFound));
    assert_eq!(outcome.state.iteration_count, 2);
    // No second model call when there is no evidence.
    let calls = harness.model.calls().await;
    assert!(calls.iter().all(|c| c.kind == PromptKind::Investigation));
}

#[tokio::test]
async fn test_publication_failure_is_terminal() {
    let harness = Harness::new(
        self_correcting_model(),
        StaticLogs::entries(ERROR_LOGS),
        RecordingPublisher::failing(CollaboratorError::AuthenticationFailed(
            "Bad credentials".into(),
        )),
    );
    let outcome = harness
        .orchestrator(3)
        .run(RunRequest::new("boom"), None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.terminal, Stage::PublishFailed);
    assert_eq!(outcome.state.publication_status, PublicationStatus::Failed);
    assert!(outcome.publication_ref().unwrap().contains("Bad credentials"));
    assert!(outcome.state.fix_validated);
    // Publication is attempted once and never retried by the workflow.
    assert_eq!(harness.publisher.requests.lock().await.len(), 1);
}

#[tokio::test]
async fn test_collaborator_failure_degrades_to_negative_pass() {
    let model = ScriptedModel::new(vec![
        Err(CollaboratorError::Unavailable("HTTP 503".into())),
        ScriptedModel::answer(DIAGNOSIS),
        ScriptedModel::answer(python_fence(FIXED_APP)),
    ]);
    let harness = Harness::new(model, StaticLogs::entries(ERROR_LOGS), RecordingPublisher::default());
    let outcome = harness
        .orchestrator(2)
        .run(RunRequest::new("boom"), None, CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.is_published());
    assert_eq!(outcome.state.iteration_count, 2);
    assert!(outcome
        .state
        .history
        .turns()
        .iter()
        .any(|t| t.content.starts_with("Investigation failed:")));
}

#[tokio::test]
async fn test_transient_failure_is_retried_within_a_pass() {
    let model = ScriptedModel::new(vec![
        Err(CollaboratorError::RateLimited("slow down".into())),
        ScriptedModel::answer(DIAGNOSIS),
        ScriptedModel::answer(python_fence(FIXED_APP)),
    ]);
    let harness = Harness::new(model, StaticLogs::entries(ERROR_LOGS), RecordingPublisher::default());
    let outcome = harness
        .orchestrator_with_retry(3, RetryPolicy::new(2, 1, 5))
        .run(RunRequest::new("boom"), None, CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.is_published());
    assert_eq!(outcome.state.iteration_count, 1);
    assert_eq!(harness.model.calls().await.len(), 3);
}

#[tokio::test]
async fn test_zero_ceiling_is_rejected() {
    let harness = Harness::new(
        self_correcting_model(),
        StaticLogs::entries(ERROR_LOGS),
        RecordingPublisher::default(),
    );
    let result = harness
        .orchestrator(0)
        .run(RunRequest::new("boom"), None, CancellationToken::new())
        .await;
    assert!(matches!(result, Err(DomainError::InvariantViolated(_))));
    assert!(harness.model.calls().await.is_empty());
}

#[tokio::test]
async fn test_cancel_before_start() {
    let harness = Harness::new(
        self_correcting_model(),
        StaticLogs::entries(ERROR_LOGS),
        RecordingPublisher::default(),
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    let (snapshots, outcome) = Arc::new(harness.orchestrator(3))
        .start(RunRequest::new("boom"), cancel)
        .finish()
        .await;
    let outcome = outcome.unwrap();

    assert_eq!(outcome.abort_reason, Some(AbortReason::Cancelled));
    assert_eq!(outcome.state.iteration_count, 0);
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].step, 0);
    assert!(snapshots[0].terminal);
    assert!(harness.model.calls().await.is_empty());
}

#[tokio::test]
async fn test_cancel_takes_effect_at_next_boundary() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let model = ScriptedModel::from_fn(move |prompt, _tools| {
        Ok(match prompt.kind {
            PromptKind::Investigation => tool_request(),
            PromptKind::LogAnalysis => ModelReply::Answer(DIAGNOSIS.into()),
            PromptKind::FixGeneration => {
                trigger.cancel();
                ModelReply::Answer(python_fence(FIXED_APP))
            }
        })
    });
    let harness = Harness::new(model, StaticLogs::entries(ERROR_LOGS), RecordingPublisher::default());

    let (snapshots, outcome) = Arc::new(harness.orchestrator(3))
        .start(RunRequest::new("boom"), cancel)
        .finish()
        .await;
    let outcome = outcome.unwrap();

    // The fixing stage that saw the cancellation still completed.
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[1].completed, Stage::Fixing);
    assert_eq!(
        snapshots[1].next,
        Stage::Aborted {
            reason: AbortReason::Cancelled
        }
    );
    assert_eq!(outcome.state.fix_source.trim(), FIXED_APP.trim());
    assert!(!outcome.state.fix_validated);
    assert!(harness.publisher.requests.lock().await.is_empty());
}

#[tokio::test]
async fn test_cancel_never_overrides_a_terminal_transition() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let model = ScriptedModel::from_fn(move |prompt, _tools| {
        trigger.cancel();
        Ok(match prompt.kind {
            PromptKind::Investigation => tool_request(),
            _ => ModelReply::Answer("Nothing conclusive.".into()),
        })
    });
    let harness = Harness::new(model, StaticLogs::entries(ERROR_LOGS), RecordingPublisher::default());
    let outcome = harness
        .orchestrator(1)
        .run(RunRequest::new("boom"), None, cancel)
        .await
        .unwrap();

    assert_eq!(outcome.abort_reason, Some(AbortReason::RootCauseNotFound));
}

#[tokio::test]
async fn test_snapshots_match_checkpoints() {
    let harness = Harness::new(
        self_correcting_model(),
        StaticLogs::entries(ERROR_LOGS),
        RecordingPublisher::default(),
    );
    let handle = Arc::new(harness.orchestrator(3)).start(
        RunRequest::new("boom").with_session_id("sre-checkpointed"),
        CancellationToken::new(),
    );
    assert_eq!(handle.session_id, "sre-checkpointed");
    let (snapshots, outcome) = handle.finish().await;
    outcome.unwrap();

    let saved = harness.checkpoints.load("sre-checkpointed").await.unwrap();
    assert_eq!(saved, snapshots);
    let steps: Vec<u32> = saved.iter().map(|s| s.step).collect();
    assert_eq!(steps, (1..=7).collect::<Vec<_>>());
    assert_eq!(saved.iter().filter(|s| s.terminal).count(), 1);
    assert!(saved.last().unwrap().terminal);
}

#[tokio::test]
async fn test_independent_runs_execute_concurrently() {
    common::setup_test_logging();
    let harness = Harness::new(
        self_correcting_model(),
        StaticLogs::entries(ERROR_LOGS),
        RecordingPublisher::default(),
    );
    let orchestrator = Arc::new(harness.orchestrator(3));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            orchestrator.clone().start(
                RunRequest::new(format!("incident {i}")).with_session_id(format!("sre-run-{i}")),
                CancellationToken::new(),
            )
        })
        .collect();

    for handle in handles {
        let (snapshots, outcome) = handle.finish().await;
        let outcome = outcome.unwrap();
        assert!(outcome.is_published());
        assert_eq!(outcome.state.iteration_count, 2);
        assert_eq!(snapshots.len(), 7);
        assert!(snapshots.iter().all(|s| s.session_id == outcome.session_id));
    }

    let mut sessions = harness.checkpoints.sessions().await.unwrap();
    sessions.sort();
    assert_eq!(sessions.len(), 8);
    assert_eq!(harness.publisher.requests.lock().await.len(), 8);
}

/// Model whose per-pass behaviour follows `plan`: (diagnoses, produces a clean fix).
fn planned_model(plan: Vec<(bool, bool)>) -> ScriptedModel {
    let passes = Arc::new(AtomicUsize::new(0));
    ScriptedModel::from_fn(move |prompt, _tools| {
        let current = |n: usize| plan[n.saturating_sub(1) % plan.len()];
        Ok(match prompt.kind {
            PromptKind::Investigation => {
                passes.fetch_add(1, Ordering::SeqCst);
                tool_request()
            }
            PromptKind::LogAnalysis => {
                if current(passes.load(Ordering::SeqCst)).0 {
                    ModelReply::Answer(DIAGNOSIS.into())
                } else {
                    ModelReply::Answer("Still looking.".into())
                }
            }
            PromptKind::FixGeneration => {
                if current(passes.load(Ordering::SeqCst)).1 {
                    ModelReply::Answer(python_fence(FIXED_APP))
                } else {
                    ModelReply::Answer(python_fence(BARE_EXCEPT_FIX))
                }
            }
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_every_run_ends_within_the_ceiling(
        ceiling in 1u32..=5,
        plan in prop::collection::vec((any::<bool>(), any::<bool>()), 1..6),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _runtime_guard = runtime.enter();
        let harness = Harness::new(
            planned_model(plan.clone()),
            StaticLogs::entries(ERROR_LOGS),
            RecordingPublisher::default(),
        );
        let (snapshots, outcome) = runtime.block_on(
            Arc::new(harness.orchestrator(ceiling))
                .start(RunRequest::new("boom"), CancellationToken::new())
                .finish(),
        );
        let outcome = outcome.unwrap();

        assert_terminal_invariants(&outcome, ceiling);
        prop_assert_eq!(snapshots.iter().filter(|s| s.terminal).count(), 1);
        prop_assert!(snapshots.last().unwrap().terminal);

        // Iteration count never decreases and grows by at most one per step.
        let mut previous = 0;
        for snapshot in &snapshots {
            let current = snapshot.state.iteration_count;
            prop_assert!(current == previous || current == previous + 1);
            previous = current;
        }

        let investigations = snapshots
            .iter()
            .filter(|s| s.completed == Stage::Investigating)
            .count();
        prop_assert!(investigations <= ceiling as usize);

        if !plan.iter().any(|(diagnosed, _)| *diagnosed) {
            prop_assert_eq!(outcome.abort_reason, Some(AbortReason::RootCauseNotFound));
        }
        if !plan.iter().any(|(_, clean)| *clean) {
            prop_assert!(!outcome.is_published());
        }
    }
}
