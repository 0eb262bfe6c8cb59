//! Remediation state machine types.
//!
//! A run moves through a closed set of stages. The transition out of a
//! stage is decided by [`Stage::next`] from the merged [`RemediationState`]
//! and the iteration ceiling; nothing else picks the next stage.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::remediation::{PublicationStatus, RemediationState};

/// Why a run ended without publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// Investigation used the whole iteration budget without a diagnosis.
    RootCauseNotFound,
    /// The last permitted fix still failed validation.
    ValidationExhausted,
    /// Cancelled externally at a transition boundary.
    Cancelled,
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RootCauseNotFound => "root_cause_not_found",
            Self::ValidationExhausted => "validation_exhausted",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Stage of a remediation run.
///
/// ```text
/// Investigating → Fixing → Validating → Publishing → Published | PublishFailed
///      ↺  ↖_______________________↙
///      ↘ Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Investigating,
    Fixing,
    Validating,
    Publishing,
    Published,
    PublishFailed,
    Aborted { reason: AbortReason },
}

impl Stage {
    /// Whether this is a terminal stage.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Published | Self::PublishFailed | Self::Aborted { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Investigating => "investigating",
            Self::Fixing => "fixing",
            Self::Validating => "validating",
            Self::Publishing => "publishing",
            Self::Published => "published",
            Self::PublishFailed => "publish_failed",
            Self::Aborted { .. } => "aborted",
        }
    }

    pub fn abort_reason(&self) -> Option<AbortReason> {
        match self {
            Self::Aborted { reason } => Some(*reason),
            _ => None,
        }
    }

    /// Decide the stage that follows `self`, given the state after `self` ran.
    ///
    /// Both budget checks use `iteration_count >= ceiling`, so Investigating
    /// runs at most `ceiling` times per run.
    pub fn next(&self, state: &RemediationState, ceiling: u32) -> DomainResult<Self> {
        let exhausted = state.iteration_count >= ceiling;
        let next = match self {
            Self::Investigating => {
                if state.root_cause_found {
                    Self::Fixing
                } else if exhausted {
                    Self::Aborted {
                        reason: AbortReason::RootCauseNotFound,
                    }
                } else {
                    Self::Investigating
                }
            }
            Self::Fixing => Self::Validating,
            Self::Validating => {
                if state.fix_validated {
                    Self::Publishing
                } else if exhausted {
                    Self::Aborted {
                        reason: AbortReason::ValidationExhausted,
                    }
                } else {
                    Self::Investigating
                }
            }
            Self::Publishing => match state.publication_status {
                PublicationStatus::Created => Self::Published,
                PublicationStatus::Failed => Self::PublishFailed,
                PublicationStatus::Pending => {
                    return Err(DomainError::InvalidTransition {
                        from: self.name().to_string(),
                        to: "publishing (no publication attempt recorded)".to_string(),
                    })
                }
            },
            Self::Published | Self::PublishFailed | Self::Aborted { .. } => {
                return Err(DomainError::InvalidTransition {
                    from: self.name().to_string(),
                    to: "any".to_string(),
                })
            }
        };
        Ok(next)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted { reason } => write!(f, "aborted ({})", reason.as_str()),
            other => f.write_str(other.name()),
        }
    }
}
