//! Remediation services: the validator, the stage handlers, and the
//! orchestrator that sequences them.

pub mod fix_validator;
pub mod orchestrator;
pub mod stages;

pub use fix_validator::FixValidator;
pub use orchestrator::{Collaborators, OrchestratorSettings, RemediationOrchestrator, RunHandle};
