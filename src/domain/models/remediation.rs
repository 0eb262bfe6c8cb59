//! The mutable record threaded through every stage of one remediation run.
//!
//! `RemediationState` is owned by the orchestrator for the lifetime of a run.
//! Stages never mutate it directly: they read it and return a [`StageOutput`]
//! which the orchestrator merges through [`RemediationState::apply`]. The merge
//! is where the state invariants are enforced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::validation::{ValidationReport, Violation};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One dialogue turn in the run's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Append-only conversation history.
///
/// There is no way to remove or replace a turn once it has been appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn extend(&mut self, turns: impl IntoIterator<Item = Turn>) {
        self.turns.extend(turns);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

/// Status of the external change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    Pending,
    Created,
    Failed,
}

impl PublicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Created => "created",
            Self::Failed => "failed",
        }
    }
}

/// A failed validation attempt, kept for the full violation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationAttempt {
    pub iteration: u32,
    pub violations: Vec<Violation>,
}

/// Typed partial update returned by a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// One pass through investigation. `narrative`/`error_log` of `None` keep the previous values.
    Investigated {
        iteration: u32,
        root_cause_found: bool,
        narrative: Option<String>,
        error_log: Option<String>,
    },
    /// A new candidate fix. Clears the previous validation result.
    FixGenerated { fix_source: String },
    /// Result of validating the current candidate.
    Validated(ValidationReport),
    /// Result of handing the validated fix to the publisher.
    PublicationAttempted { ok: bool, reference: String },
}

/// What a stage hands back to the orchestrator: the update plus turns to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    pub outcome: StageOutcome,
    pub turns: Vec<Turn>,
}

impl StageOutput {
    pub fn new(outcome: StageOutcome) -> Self {
        Self {
            outcome,
            turns: Vec::new(),
        }
    }

    pub fn with_turn(mut self, turn: Turn) -> Self {
        self.turns.push(turn);
        self
    }
}

/// State of a single remediation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationState {
    pub history: ConversationLog,
    pub error_log: String,
    pub root_cause_found: bool,
    pub root_cause_narrative: String,
    pub fix_source: String,
    pub fix_validated: bool,
    pub validation_errors: Vec<String>,
    pub validation_history: Vec<ValidationAttempt>,
    pub publication_status: PublicationStatus,
    pub publication_ref: String,
    pub iteration_count: u32,
    pub started_at: DateTime<Utc>,
}

impl RemediationState {
    /// Create the initial state for a run triggered by `error_description`.
    pub fn new(error_description: impl Into<String>) -> Self {
        let mut history = ConversationLog::new();
        history.append(Turn::user(error_description));
        Self {
            history,
            error_log: String::new(),
            root_cause_found: false,
            root_cause_narrative: String::new(),
            fix_source: String::new(),
            fix_validated: false,
            validation_errors: Vec::new(),
            validation_history: Vec::new(),
            publication_status: PublicationStatus::Pending,
            publication_ref: String::new(),
            iteration_count: 0,
            started_at: Utc::now(),
        }
    }

    /// Merge a stage's output into the state.
    ///
    /// Turns are appended; every other field is overwritten by the outcome.
    pub fn apply(&mut self, output: StageOutput) -> DomainResult<()> {
        match output.outcome {
            StageOutcome::Investigated {
                iteration,
                root_cause_found,
                narrative,
                error_log,
            } => {
                if iteration != self.iteration_count + 1 {
                    return Err(DomainError::InvariantViolated(format!(
                        "iteration must advance by one (was {}, got {})",
                        self.iteration_count, iteration
                    )));
                }
                self.iteration_count = iteration;
                self.root_cause_found = root_cause_found;
                if let Some(narrative) = narrative {
                    self.root_cause_narrative = narrative;
                }
                if let Some(log) = error_log {
                    self.error_log = log;
                }
            }
            StageOutcome::FixGenerated { fix_source } => {
                self.fix_source = fix_source;
                self.fix_validated = false;
                self.validation_errors.clear();
            }
            StageOutcome::Validated(report) => {
                self.fix_validated = report.passed;
                self.validation_errors = report.messages();
                if !report.passed {
                    self.validation_history.push(ValidationAttempt {
                        iteration: self.iteration_count,
                        violations: report.violations,
                    });
                }
            }
            StageOutcome::PublicationAttempted { ok, reference } => {
                if ok && !self.fix_validated {
                    return Err(DomainError::InvariantViolated(
                        "cannot publish a fix that has not been validated".to_string(),
                    ));
                }
                self.publication_status = if ok {
                    PublicationStatus::Created
                } else {
                    PublicationStatus::Failed
                };
                self.publication_ref = reference;
            }
        }
        self.history.extend(output.turns);
        Ok(())
    }

    /// Every violation collected across the run, oldest first.
    pub fn violation_history(&self) -> impl Iterator<Item = &Violation> {
        self.validation_history.iter().flat_map(|a| a.violations.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::validation::ViolationCategory;

    fn investigated(iteration: u32, found: bool) -> StageOutput {
        StageOutput::new(StageOutcome::Investigated {
            iteration,
            root_cause_found: found,
            narrative: Some(format!("analysis {iteration}")),
            error_log: None,
        })
    }

    #[test]
    fn test_initial_state() {
        let state = RemediationState::new("KeyError on /api/data");
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history.turns()[0].role, Role::User);
        assert_eq!(state.iteration_count, 0);
        assert_eq!(state.publication_status, PublicationStatus::Pending);
        assert!(state.fix_source.is_empty());
        assert!(state.error_log.is_empty());
    }

    #[test]
    fn test_iteration_must_advance_by_one() {
        let mut state = RemediationState::new("boom");
        state.apply(investigated(1, false)).unwrap();
        assert_eq!(state.iteration_count, 1);

        let err = state.apply(investigated(3, false)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolated(_)));
        assert_eq!(state.iteration_count, 1);
    }

    #[test]
    fn test_failed_investigation_keeps_previous_narrative() {
        let mut state = RemediationState::new("boom");
        state.apply(investigated(1, true)).unwrap();
        state
            .apply(StageOutput::new(StageOutcome::Investigated {
                iteration: 2,
                root_cause_found: false,
                narrative: None,
                error_log: None,
            }))
            .unwrap();
        assert_eq!(state.root_cause_narrative, "analysis 1");
        assert!(!state.root_cause_found);
    }

    #[test]
    fn test_history_is_append_only() {
        let mut state = RemediationState::new("boom");
        state
            .apply(investigated(1, false).with_turn(Turn::assistant("first")))
            .unwrap();
        state
            .apply(investigated(2, false).with_turn(Turn::assistant("second")))
            .unwrap();
        let contents: Vec<_> = state.history.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["boom", "first", "second"]);
    }

    #[test]
    fn test_new_fix_clears_validation() {
        let mut state = RemediationState::new("boom");
        state.apply(investigated(1, true)).unwrap();
        state
            .apply(StageOutput::new(StageOutcome::Validated(
                ValidationReport::from_violations(vec![Violation::new(
                    ViolationCategory::Syntax,
                    "Syntax error at line 1, column 1",
                )]),
            )))
            .unwrap();
        assert_eq!(state.validation_errors.len(), 1);
        assert_eq!(state.validation_history.len(), 1);

        state
            .apply(StageOutput::new(StageOutcome::FixGenerated {
                fix_source: "def f():\n    pass\n".into(),
            }))
            .unwrap();
        assert!(state.validation_errors.is_empty());
        assert!(!state.fix_validated);
        // history of failures survives a new fix
        assert_eq!(state.validation_history.len(), 1);
    }

    #[test]
    fn test_validated_implies_no_errors() {
        let mut state = RemediationState::new("boom");
        state
            .apply(StageOutput::new(StageOutcome::Validated(ValidationReport::passed())))
            .unwrap();
        assert!(state.fix_validated);
        assert!(state.validation_errors.is_empty());
    }

    #[test]
    fn test_publication_requires_validated_fix() {
        let mut state = RemediationState::new("boom");
        let err = state
            .apply(StageOutput::new(StageOutcome::PublicationAttempted {
                ok: true,
                reference: "https://example.test/pull/1".into(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolated(_)));
        assert_eq!(state.publication_status, PublicationStatus::Pending);

        state
            .apply(StageOutput::new(StageOutcome::PublicationAttempted {
                ok: false,
                reference: "HTTP 422".into(),
            }))
            .unwrap();
        assert_eq!(state.publication_status, PublicationStatus::Failed);
    }

    #[test]
    fn test_state_serde_roundtrip() {
        let mut state = RemediationState::new("boom");
        state.apply(investigated(1, true)).unwrap();
        let json = serde_json::to_string(&state).unwrap();
        let back: RemediationState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
