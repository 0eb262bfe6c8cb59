//! Run requests, per-stage snapshots, and final run outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::remediation::{PublicationStatus, RemediationState};
use crate::domain::models::validation::Violation;
use crate::domain::models::workflow_state::{AbortReason, Stage};

/// Request to start a remediation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Free-text description of the observed error.
    pub error_description: String,
    /// Optional id used only to correlate checkpoints.
    pub session_id: Option<String>,
}

impl RunRequest {
    pub fn new(error_description: impl Into<String>) -> Self {
        Self {
            error_description: error_description.into(),
            session_id: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// The caller's session id, or a fresh `sre-workflow-<timestamp>-<short uuid>`.
    pub fn resolve_session_id(&self) -> String {
        self.session_id
            .as_ref()
            .filter(|id| !id.trim().is_empty())
            .cloned()
            .unwrap_or_else(generate_session_id)
    }
}

/// Generate a session id of the form `sre-workflow-20240101-120000-1a2b3c4d`.
pub fn generate_session_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!(
        "sre-workflow-{}-{}",
        Utc::now().format("%Y%m%d-%H%M%S"),
        &uuid[..8]
    )
}

/// Session ids name checkpoint files: ASCII alphanumerics, `-`, `_` and `.`,
/// not starting with `.`.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// State after one completed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub session_id: String,
    /// 1-based count of completed stages in this run.
    pub step: u32,
    pub completed: Stage,
    pub next: Stage,
    pub terminal: bool,
    pub abort_reason: Option<AbortReason>,
    pub recorded_at: DateTime<Utc>,
    pub state: RemediationState,
}

impl StateSnapshot {
    pub fn new(
        session_id: impl Into<String>,
        step: u32,
        completed: Stage,
        next: Stage,
        state: RemediationState,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            step,
            completed,
            next,
            terminal: next.is_terminal(),
            abort_reason: next.abort_reason(),
            recorded_at: Utc::now(),
            state,
        }
    }
}

/// Final result of a remediation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub session_id: String,
    pub terminal: Stage,
    pub abort_reason: Option<AbortReason>,
    pub state: RemediationState,
}

impl RunOutcome {
    pub fn new(session_id: impl Into<String>, terminal: Stage, state: RemediationState) -> Self {
        Self {
            session_id: session_id.into(),
            terminal,
            abort_reason: terminal.abort_reason(),
            state,
        }
    }

    pub fn is_published(&self) -> bool {
        self.terminal == Stage::Published
    }

    pub fn narrative(&self) -> &str {
        &self.state.root_cause_narrative
    }

    /// Every violation recorded across the run, oldest first.
    pub fn violations(&self) -> Vec<&Violation> {
        self.state.violation_history().collect()
    }

    /// Publication reference, present once publication was attempted.
    pub fn publication_ref(&self) -> Option<&str> {
        match self.state.publication_status {
            PublicationStatus::Pending => None,
            PublicationStatus::Created | PublicationStatus::Failed => {
                Some(self.state.publication_ref.as_str())
            }
        }
    }
}
