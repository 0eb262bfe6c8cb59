//! Remediation orchestrator.
//!
//! Owns the [`RemediationState`] of a run, dispatches to the active stage,
//! merges the stage's output, and asks [`Stage::next`] where to go. One
//! stage runs at a time; a run ends only in a terminal stage.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::config::Config;
use crate::domain::models::remediation::RemediationState;
use crate::domain::models::snapshot::{RunOutcome, RunRequest, StateSnapshot};
use crate::domain::models::workflow_state::{AbortReason, Stage};
use crate::domain::ports::{CheckpointStore, LanguageModel, LogSource, Publisher, SourceReader};
use crate::infrastructure::retry::RetryPolicy;
use crate::services::stages::{
    FixGenerationStage, InvestigationStage, LogQuery, PublicationStage, ValidationStage,
};

/// Snapshot channel capacity used by [`RemediationOrchestrator::start`].
const SNAPSHOT_BUFFER: usize = 32;

/// External collaborators a run depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub model: Arc<dyn LanguageModel>,
    pub logs: Arc<dyn LogSource>,
    pub publisher: Arc<dyn Publisher>,
    pub source: Arc<dyn SourceReader>,
    pub checkpoints: Arc<dyn CheckpointStore>,
}

/// Per-orchestrator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    /// Iteration ceiling; must be positive.
    pub max_iterations: u32,
    pub target_path: String,
    pub log_query: LogQuery,
    pub temperature: f32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            target_path: "app.py".to_string(),
            log_query: LogQuery::default(),
            temperature: 0.0,
        }
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_iterations: config.workflow.max_iterations,
            target_path: config.workflow.target_path.clone(),
            log_query: LogQuery {
                window: config.workflow.log_window.clone(),
                severity: config.workflow.log_severity.clone(),
            },
            temperature: config.llm.temperature,
        }
    }
}

/// Handle to a run started with [`RemediationOrchestrator::start`].
pub struct RunHandle {
    pub session_id: String,
    pub snapshots: mpsc::Receiver<StateSnapshot>,
    pub join: JoinHandle<DomainResult<RunOutcome>>,
}

impl RunHandle {
    /// Drain every snapshot, then wait for the outcome.
    pub async fn finish(mut self) -> (Vec<StateSnapshot>, DomainResult<RunOutcome>) {
        let mut snapshots = Vec::new();
        while let Some(snapshot) = self.snapshots.recv().await {
            snapshots.push(snapshot);
        }
        let outcome = match self.join.await {
            Ok(outcome) => outcome,
            Err(err) => Err(DomainError::ExecutionFailed(format!("run task failed: {err}"))),
        };
        (snapshots, outcome)
    }
}

/// Drives remediation runs. Holds no per-run state.
pub struct RemediationOrchestrator {
    investigation: InvestigationStage,
    fix_generation: FixGenerationStage,
    validation: ValidationStage,
    publication: PublicationStage,
    checkpoints: Arc<dyn CheckpointStore>,
    max_iterations: u32,
}

impl RemediationOrchestrator {
    pub fn new(collaborators: Collaborators, settings: OrchestratorSettings, retry: RetryPolicy) -> Self {
        let Collaborators {
            model,
            logs,
            publisher,
            source,
            checkpoints,
        } = collaborators;

        Self {
            investigation: InvestigationStage::new(
                model.clone(),
                logs,
                retry.clone(),
                settings.log_query,
                settings.temperature,
            ),
            fix_generation: FixGenerationStage::new(
                model,
                source.clone(),
                retry.clone(),
                settings.target_path.clone(),
                settings.temperature,
            ),
            validation: ValidationStage::new(source, settings.target_path.clone()),
            publication: PublicationStage::new(publisher, retry, settings.target_path),
            checkpoints,
            max_iterations: settings.max_iterations,
        }
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Start a run on a background task and stream its snapshots.
    pub fn start(self: Arc<Self>, request: RunRequest, cancel: CancellationToken) -> RunHandle {
        let session_id = request.resolve_session_id();
        let request = RunRequest {
            session_id: Some(session_id.clone()),
            ..request
        };
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let join = tokio::spawn(async move { self.run(request, Some(tx), cancel).await });
        RunHandle {
            session_id,
            snapshots: rx,
            join,
        }
    }

    /// Run to a terminal stage.
    ///
    /// Every completed stage emits one snapshot to `events` and the checkpoint
    /// store; the last one is terminal. `cancel` is honoured only between stages.
    pub async fn run(
        &self,
        request: RunRequest,
        events: Option<mpsc::Sender<StateSnapshot>>,
        cancel: CancellationToken,
    ) -> DomainResult<RunOutcome> {
        if self.max_iterations == 0 {
            return Err(DomainError::InvariantViolated(
                "iteration ceiling must be at least 1".to_string(),
            ));
        }

        let session_id = request.resolve_session_id();
        let span = info_span!("remediation_run", session_id = %session_id);
        self.drive(session_id, request.error_description, events, cancel)
            .instrument(span)
            .await
    }

    async fn drive(
        &self,
        session_id: String,
        error_description: String,
        events: Option<mpsc::Sender<StateSnapshot>>,
        cancel: CancellationToken,
    ) -> DomainResult<RunOutcome> {
        let ceiling = self.max_iterations;
        let mut state = RemediationState::new(error_description);
        let mut stage = Stage::Investigating;
        let mut step = 0;
        info!(ceiling, "Remediation run started");

        if cancel.is_cancelled() {
            let aborted = Stage::Aborted {
                reason: AbortReason::Cancelled,
            };
            info!("Run cancelled before the first stage");
            self.emit(events.as_ref(), StateSnapshot::new(&session_id, step, aborted, aborted, state.clone()))
                .await;
            return Ok(RunOutcome::new(session_id, aborted, state));
        }

        loop {
            let output = match stage {
                Stage::Investigating => self.investigation.run(&state).await,
                Stage::Fixing => self.fix_generation.run(&state).await,
                Stage::Validating => self.validation.run(&state).await,
                Stage::Publishing => self.publication.run(&state).await,
                Stage::Published | Stage::PublishFailed | Stage::Aborted { .. } => {
                    return Err(DomainError::InvalidTransition {
                        from: stage.name().to_string(),
                        to: "any".to_string(),
                    })
                }
            };
            state.apply(output)?;

            let mut next = stage.next(&state, ceiling)?;
            if !next.is_terminal() && cancel.is_cancelled() {
                next = Stage::Aborted {
                    reason: AbortReason::Cancelled,
                };
            }
            step += 1;
            info!(
                step,
                completed = stage.name(),
                next = %next,
                iteration = state.iteration_count,
                "Stage transition"
            );

            self.emit(events.as_ref(), StateSnapshot::new(&session_id, step, stage, next, state.clone()))
                .await;

            if next.is_terminal() {
                info!(
                    outcome = %next,
                    iterations = state.iteration_count,
                    publication = state.publication_status.as_str(),
                    "Remediation run finished"
                );
                return Ok(RunOutcome::new(session_id, next, state));
            }
            stage = next;
        }
    }

    async fn emit(&self, events: Option<&mpsc::Sender<StateSnapshot>>, snapshot: StateSnapshot) {
        if let Err(err) = self.checkpoints.save(&snapshot).await {
            warn!(error = %err, step = snapshot.step, "Failed to save checkpoint");
        }
        if let Some(tx) = events {
            if tx.send(snapshot).await.is_err() {
                debug!("Snapshot receiver dropped");
            }
        }
    }
}
