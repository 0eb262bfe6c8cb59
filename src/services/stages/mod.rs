//! Stage handlers.
//!
//! Each handler reads the current [`RemediationState`](crate::domain::models::RemediationState)
//! and returns a [`StageOutput`](crate::domain::models::StageOutput). Handlers never fail:
//! a collaborator error that survives its retries becomes the stage's negative outcome.

pub mod fix_generation;
pub mod investigation;
pub mod publication;
pub mod validation;

pub use fix_generation::{extract_code, FixGenerationStage};
pub use investigation::{mentions_root_cause, InvestigationStage, LogQuery};
pub use publication::{build_description, build_title, PublicationStage};
pub use validation::ValidationStage;

/// Render violations as a bulleted list for prompt feedback.
pub(crate) fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
