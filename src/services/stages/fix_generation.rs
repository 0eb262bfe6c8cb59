//! Fix-generation stage: ask the model for a complete replacement of the
//! file under repair.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::models::remediation::{RemediationState, StageOutcome, StageOutput, Turn};
use crate::domain::ports::{LanguageModel, Prompt, PromptKind, SourceReader};
use crate::infrastructure::retry::RetryPolicy;

use super::bullet_list;

const SYSTEM_PROMPT: &str = "You are an expert Python developer specializing in fixing production bugs.

Your task is to generate a corrected version of the buggy code based on the root cause analysis.

Requirements:
1. Provide the COMPLETE fixed code for the file, not just a snippet
2. Fix the specific issue identified in the root cause analysis
3. Use defensive programming practices (e.g., .get() instead of direct dict access)
4. Preserve all other functionality and every existing function
5. Never use a bare `except:`; catch specific exception types
6. Add comments explaining the fix";

/// Pull code out of a fenced block; `python` fences win over bare ones.
pub fn extract_code(reply: &str) -> String {
    let fenced = |marker: &str| {
        reply
            .split_once(marker)
            .map(|(_, rest)| rest.split("```").next().unwrap_or_default().trim().to_string())
    };
    fenced("```python")
        .or_else(|| fenced("```"))
        .unwrap_or_else(|| reply.trim().to_string())
}

pub struct FixGenerationStage {
    model: Arc<dyn LanguageModel>,
    source: Arc<dyn SourceReader>,
    retry: RetryPolicy,
    target_path: String,
    temperature: f32,
}

impl FixGenerationStage {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        source: Arc<dyn SourceReader>,
        retry: RetryPolicy,
        target_path: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            model,
            source,
            retry,
            target_path: target_path.into(),
            temperature,
        }
    }

    pub async fn run(&self, state: &RemediationState) -> StageOutput {
        let original = match self.source.read(&self.target_path).await {
            Ok(code) => code,
            Err(err) => {
                warn!(path = %self.target_path, error = %err, "Could not read source under repair");
                format!("[Could not read original {} file]", self.target_path)
            }
        };

        let prompt = Prompt::new(PromptKind::FixGeneration, system_prompt(&state.validation_errors))
            .with_temperature(self.temperature)
            .with_user(format!(
                "Root Cause Analysis:\n{}\n\nOriginal Buggy Code:\n```python\n{original}\n```\n\n\
                 Please provide the COMPLETE fixed version of {} that solves this issue.\n\
                 Respond with ONLY the Python code, no explanations before or after.",
                state.root_cause_narrative, self.target_path
            ));

        let (fix_source, turn) = match self
            .retry
            .execute(|| self.model.invoke(&prompt, &[]))
            .await
        {
            Ok(reply) => {
                let code = extract_code(reply.text());
                info!(chars = code.len(), "Generated fix");
                let turn = Turn::assistant(format!(
                    "I've generated a fix for {} ({} characters).",
                    self.target_path,
                    code.len()
                ));
                (code, turn)
            }
            Err(err) => {
                warn!(error = %err, "Fix generation failed");
                (String::new(), Turn::assistant(format!("Fix generation failed: {err}")))
            }
        };

        StageOutput::new(StageOutcome::FixGenerated { fix_source }).with_turn(turn)
    }
}

fn system_prompt(validation_errors: &[String]) -> String {
    if validation_errors.is_empty() {
        return SYSTEM_PROMPT.to_string();
    }
    format!(
        "{SYSTEM_PROMPT}\n\nWARNING: Your previous fix failed validation with these errors:\n{}\n\n\
         Please generate a NEW fix that addresses these validation failures.",
        bullet_list(validation_errors)
    )
}
