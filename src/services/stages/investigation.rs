//! Investigation stage: fetch logs through the model's tool request and
//! ask for a root-cause analysis.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::errors::CollaboratorError;
use crate::domain::models::remediation::{RemediationState, StageOutcome, StageOutput, Turn};
use crate::domain::ports::{
    LanguageModel, LogFetch, LogSource, ModelReply, Prompt, PromptKind, ToolCall, ToolKind,
};
use crate::infrastructure::retry::RetryPolicy;

use super::bullet_list;

const SYSTEM_PROMPT: &str = "You are an expert Site Reliability Engineer specializing in debugging production issues.

Your task is to analyze application logs, identify the root cause of errors, and provide a clear explanation.

Steps:
1. Use the fetch_logs tool to retrieve recent error logs
2. Carefully analyze the stack traces, error messages, and context
3. Identify the specific line of code causing the issue
4. Determine the root cause (e.g., missing dictionary key, null pointer, type mismatch)
5. Provide a clear, concise explanation of what went wrong and why

Be thorough but focused. Your analysis will be used by another agent to generate a fix.";

/// Phrases that mark an analysis as a diagnosis.
const ROOT_CAUSE_PHRASES: [&str; 6] = [
    "root cause",
    "the issue is",
    "the error occurs because",
    "keyerror",
    "missing key",
    "the bug is",
];

/// Whether `analysis` commits to a root cause.
pub fn mentions_root_cause(analysis: &str) -> bool {
    let lower = analysis.to_lowercase();
    ROOT_CAUSE_PHRASES.iter().any(|p| lower.contains(p))
}

/// Log query used when the model does not specify one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub window: String,
    pub severity: String,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            window: "1h".to_string(),
            severity: "error".to_string(),
        }
    }
}

pub struct InvestigationStage {
    model: Arc<dyn LanguageModel>,
    logs: Arc<dyn LogSource>,
    retry: RetryPolicy,
    defaults: LogQuery,
    temperature: f32,
}

/// What one pass learned before the outcome is assembled.
struct Findings {
    analysis: Option<String>,
    error_log: Option<String>,
    /// Set when a pass produced no analysis because a call failed.
    note: Option<String>,
}

impl InvestigationStage {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        logs: Arc<dyn LogSource>,
        retry: RetryPolicy,
        defaults: LogQuery,
        temperature: f32,
    ) -> Self {
        Self {
            model,
            logs,
            retry,
            defaults,
            temperature,
        }
    }

    pub async fn run(&self, state: &RemediationState) -> StageOutput {
        let iteration = state.iteration_count + 1;
        info!(iteration, "Investigating");

        let system = system_prompt(&state.validation_errors);
        let findings = match self.investigate(&system, state).await {
            Ok(findings) => findings,
            Err(err) => {
                warn!(iteration, error = %err, "Investigation pass failed");
                Findings {
                    analysis: None,
                    error_log: None,
                    note: Some(format!("Investigation failed: {err}")),
                }
            }
        };

        let root_cause_found = findings
            .analysis
            .as_deref()
            .is_some_and(mentions_root_cause);
        info!(iteration, root_cause_found, "Investigation pass complete");

        let turn = match (&findings.analysis, findings.note) {
            (Some(analysis), _) => Turn::assistant(format!("Investigation Result:\n\n{analysis}")),
            (None, Some(note)) => Turn::assistant(note),
            (None, None) => Turn::assistant("Investigation Result:\n\nNo log evidence available."),
        };

        StageOutput::new(StageOutcome::Investigated {
            iteration,
            root_cause_found,
            narrative: findings.analysis,
            error_log: findings.error_log,
        })
        .with_turn(turn)
    }

    async fn investigate(
        &self,
        system: &str,
        state: &RemediationState,
    ) -> Result<Findings, CollaboratorError> {
        let prompt = Prompt::new(PromptKind::Investigation, system)
            .with_turns(state.history.turns().iter().cloned())
            .with_temperature(self.temperature);
        let tools = [ToolKind::FetchLogs];

        let reply = self
            .retry
            .execute(|| self.model.invoke(&prompt, &tools))
            .await?;

        let (call, preamble) = match reply {
            ModelReply::Answer(text) => {
                debug!("Model answered without requesting logs");
                return Ok(Findings {
                    analysis: Some(text),
                    error_log: None,
                    note: None,
                });
            }
            ModelReply::ToolRequest { call, preamble } => (call, preamble),
        };

        let ToolCall::FetchLogs { window, severity } = call;
        let window = window.unwrap_or_else(|| self.defaults.window.clone());
        let severity = severity.unwrap_or_else(|| self.defaults.severity.clone());
        debug!(%window, %severity, "Fetching logs");

        let fetched = self
            .retry
            .execute(|| self.logs.fetch(&window, &severity))
            .await?;

        let logs = match fetched {
            LogFetch::NoLogs(reason) => {
                info!(%reason, "No log evidence");
                return Ok(Findings {
                    analysis: None,
                    error_log: None,
                    note: None,
                });
            }
            LogFetch::Entries { text, line_count } => {
                debug!(line_count, "Retrieved logs");
                text
            }
        };

        let mut analysis_prompt = Prompt::new(PromptKind::LogAnalysis, system)
            .with_turns(state.history.turns().iter().cloned())
            .with_temperature(self.temperature);
        if !preamble.trim().is_empty() {
            analysis_prompt.turns.push(Turn::assistant(preamble));
        }
        let analysis_prompt = analysis_prompt.with_user(format!(
            "Here are the logs:\n\n{logs}\n\nNow analyze these logs and identify the root cause."
        ));

        match self
            .retry
            .execute(|| self.model.invoke(&analysis_prompt, &[]))
            .await
        {
            Ok(reply) => Ok(Findings {
                analysis: Some(reply.text().to_string()),
                error_log: Some(logs),
                note: None,
            }),
            Err(err) => {
                warn!(error = %err, "Log analysis failed");
                Ok(Findings {
                    analysis: None,
                    error_log: Some(logs),
                    note: Some(format!("Log analysis failed: {err}")),
                })
            }
        }
    }
}

fn system_prompt(validation_errors: &[String]) -> String {
    if validation_errors.is_empty() {
        return SYSTEM_PROMPT.to_string();
    }
    format!(
        "{SYSTEM_PROMPT}\n\nIMPORTANT: A previous fix attempt failed with these validation errors:\n{}\n\n\
         Please reconsider the root cause analysis with this feedback in mind. \
         The previous fix didn't work correctly.",
        bullet_list(validation_errors)
    )
}
