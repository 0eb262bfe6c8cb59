//! Publication stage: hand the validated fix to the publisher.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::models::remediation::{RemediationState, StageOutcome, StageOutput, Turn};
use crate::domain::ports::{PublishRequest, Publisher};
use crate::infrastructure::retry::RetryPolicy;

const TITLE_PREFIX: &str = "[Automated Fix] ";

/// `[Automated Fix] <first line of the narrative>`; truncation happens in [`PublishRequest::new`].
pub fn build_title(narrative: &str) -> String {
    let headline = narrative
        .lines()
        .map(|l| l.trim().trim_start_matches(['#', '*', '-']).trim())
        .find(|l| !l.is_empty())
        .unwrap_or("Unknown root cause detected");
    format!("{TITLE_PREFIX}{headline}")
}

pub fn build_description(state: &RemediationState) -> String {
    let failed_attempts = state.validation_history.len();
    let validation = if failed_attempts == 0 {
        "All automated checks passed (syntax, function preservation, exception-handling lint)."
            .to_string()
    } else {
        format!(
            "Passed after {} iteration(s); {failed_attempts} earlier candidate(s) failed validation.",
            state.iteration_count
        )
    };

    format!(
        "## Automated Fix by Self-Healing SRE Agent\n\n\
         This PR was automatically generated after detecting and analyzing a production error.\n\n\
         ### Root Cause Analysis\n{}\n\n\
         ### Validation\n{validation}\n\n\
         ### Human Review Required\n\
         This PR was created automatically. Please review carefully before merging.\n\n\
         ---\n\
         *Timestamp: {}*\n\
         *Iterations: {}*\n",
        state.root_cause_narrative,
        Utc::now().to_rfc3339(),
        state.iteration_count
    )
}

pub struct PublicationStage {
    publisher: Arc<dyn Publisher>,
    retry: RetryPolicy,
    target_path: String,
}

impl PublicationStage {
    pub fn new(
        publisher: Arc<dyn Publisher>,
        retry: RetryPolicy,
        target_path: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            retry,
            target_path: target_path.into(),
        }
    }

    pub async fn run(&self, state: &RemediationState) -> StageOutput {
        let request = PublishRequest::new(
            &build_title(&state.root_cause_narrative),
            build_description(state),
            state.fix_source.clone(),
            self.target_path.clone(),
        );
        info!(publisher = self.publisher.name(), title = %request.title, "Publishing fix");

        let (ok, reference) = match self
            .retry
            .execute(|| self.publisher.publish(&request))
            .await
        {
            Ok(receipt) => (receipt.ok, receipt.reference),
            Err(err) => {
                warn!(error = %err, "Publication failed");
                (false, err.to_string())
            }
        };

        let turn = if ok {
            info!(reference = %reference, "Change request created");
            Turn::assistant(format!("Pull Request created:\n\n{reference}"))
        } else {
            Turn::assistant(format!("PR creation failed:\n\n{reference}"))
        };

        StageOutput::new(StageOutcome::PublicationAttempted { ok, reference }).with_turn(turn)
    }
}
