//! Validation stage: run the static gate over the current candidate.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::models::remediation::{RemediationState, StageOutcome, StageOutput, Turn};
use crate::domain::models::validation::{ValidationReport, Violation, ViolationCategory};
use crate::domain::ports::SourceReader;
use crate::services::fix_validator::FixValidator;

pub struct ValidationStage {
    validator: FixValidator,
    source: Arc<dyn SourceReader>,
    target_path: String,
}

impl ValidationStage {
    pub fn new(source: Arc<dyn SourceReader>, target_path: impl Into<String>) -> Self {
        Self {
            validator: FixValidator::new(),
            source,
            target_path: target_path.into(),
        }
    }

    pub async fn run(&self, state: &RemediationState) -> StageOutput {
        if state.fix_source.trim().is_empty() {
            warn!("No fix code to validate");
            let report = ValidationReport::from_violations(vec![Violation::new(
                ViolationCategory::Empty,
                "No fix code provided",
            )]);
            return StageOutput::new(StageOutcome::Validated(report))
                .with_turn(Turn::assistant("Validation failed: No fix code to test"));
        }

        // An unreadable original only disables the interface check.
        let original = self.source.read(&self.target_path).await.ok();
        let report = self
            .validator
            .validate(&state.fix_source, original.as_deref());

        let turn = if report.passed {
            info!("Fix passed validation");
            Turn::assistant(format!("[VALIDATION SUCCESS] {}", report.summary()))
        } else {
            for violation in &report.violations {
                info!(category = %violation.category, message = %violation.message, "Violation");
            }
            Turn::assistant(format!(
                "[VALIDATION FAILED]\n{}",
                report.messages().join("\n")
            ))
        };

        StageOutput::new(StageOutcome::Validated(report)).with_turn(turn)
    }
}
