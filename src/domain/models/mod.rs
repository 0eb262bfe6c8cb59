//! Domain models for remediation runs.

pub mod config;
pub mod remediation;
pub mod snapshot;
pub mod validation;
pub mod workflow_state;

pub use config::{
    CheckpointConfig, Config, GitHubConfig, LlmConfig, LogSourceConfig, LoggingConfig,
    ProviderConfig, PublicationConfig, RetryConfig, WorkflowConfig,
};
pub use remediation::{
    ConversationLog, PublicationStatus, RemediationState, Role, StageOutcome, StageOutput, Turn,
    ValidationAttempt,
};
pub use snapshot::{generate_session_id, is_valid_session_id, RunOutcome, RunRequest, StateSnapshot};
pub use validation::{ValidationReport, Violation, ViolationCategory};
pub use workflow_state::{AbortReason, Stage};
