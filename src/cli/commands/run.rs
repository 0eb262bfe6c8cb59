//! `selfheal run`: drive one remediation to a terminal stage.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use comfy_table::Cell;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::display::{
    colorize_category, colorize_stage, list_table, output, summary_table, truncate, yes_no,
    CommandOutput, DetailView,
};
use crate::cli::service::build_orchestrator;
use crate::domain::models::config::Config;
use crate::domain::models::snapshot::{is_valid_session_id, RunOutcome, RunRequest, StateSnapshot};
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Incident description handed to the investigator
    #[arg(short, long)]
    pub error: Option<String>,

    /// Session id used to correlate checkpoints
    #[arg(long, value_parser = parse_session_id)]
    pub session_id: Option<String>,

    /// Override the iteration ceiling
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_iterations: Option<u32>,

    /// Use the scripted model and simulated publisher; no network access
    #[arg(long)]
    pub dry_run: bool,
}

/// Accept only ids the checkpoint store can name a file after.
pub fn parse_session_id(value: &str) -> Result<String, String> {
    if is_valid_session_id(value) {
        Ok(value.to_string())
    } else {
        Err(format!(
            "invalid session id {value:?}: use letters, digits, '-', '_' or '.', not starting with '.'"
        ))
    }
}

/// Alert text used when no `--error` is given.
pub fn default_alert() -> String {
    format!(
        "ALERT: Application Error Detected\n\n\
         Endpoint: /api/data\n\
         Status: 500 Internal Server Error\n\
         Error Type: KeyError\n\
         Timestamp: {}\n\n\
         The monitoring system has detected a crash in the production API.\n\
         Please investigate and fix the issue.",
        Utc::now().to_rfc3339()
    )
}

#[derive(Debug, Serialize)]
pub struct ViolationRow {
    pub iteration: u32,
    pub category: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub session_id: String,
    pub outcome: String,
    pub abort_reason: Option<String>,
    pub iterations: u32,
    pub root_cause_found: bool,
    pub fix_validated: bool,
    pub publication_status: String,
    pub publication_ref: Option<String>,
    pub narrative: String,
    pub violation_history: Vec<ViolationRow>,
    pub steps: usize,
}

impl RunSummary {
    pub fn new(outcome: &RunOutcome, steps: usize) -> Self {
        let state = &outcome.state;
        Self {
            session_id: outcome.session_id.clone(),
            outcome: outcome.terminal.name().to_string(),
            abort_reason: outcome.abort_reason.map(|r| r.as_str().to_string()),
            iterations: state.iteration_count,
            root_cause_found: state.root_cause_found,
            fix_validated: state.fix_validated,
            publication_status: state.publication_status.as_str().to_string(),
            publication_ref: outcome.publication_ref().map(str::to_string),
            narrative: outcome.narrative().to_string(),
            violation_history: state
                .validation_history
                .iter()
                .flat_map(|attempt| {
                    attempt.violations.iter().map(move |v| ViolationRow {
                        iteration: attempt.iteration,
                        category: v.category.as_str().to_string(),
                        message: v.message.clone(),
                    })
                })
                .collect(),
            steps,
        }
    }
}

impl CommandOutput for RunSummary {
    fn to_human(&self) -> String {
        let outcome = match &self.abort_reason {
            Some(reason) => format!("{} ({reason})", self.outcome),
            None => self.outcome.clone(),
        };

        let mut table = summary_table();
        table.add_row(vec![Cell::new("Session"), Cell::new(&self.session_id)]);
        table.add_row(vec![Cell::new("Outcome"), Cell::new(colorize_stage(&outcome))]);
        table.add_row(vec![Cell::new("Iterations"), Cell::new(self.iterations)]);
        table.add_row(vec![
            Cell::new("Root cause found"),
            Cell::new(yes_no(self.root_cause_found)),
        ]);
        table.add_row(vec![
            Cell::new("Fix validated"),
            Cell::new(yes_no(self.fix_validated)),
        ]);
        table.add_row(vec![
            Cell::new("Publication"),
            Cell::new(&self.publication_status),
        ]);
        if let Some(reference) = &self.publication_ref {
            table.add_row(vec![Cell::new("Reference"), Cell::new(reference)]);
        }

        let narrative = if self.narrative.trim().is_empty() {
            "(no root cause narrative)".dimmed().to_string()
        } else {
            self.narrative.clone()
        };
        let mut sections = vec![
            format!("{}", "Remediation Summary".bold()),
            table.to_string(),
            DetailView::new("Root Cause Analysis").body(&narrative).render(),
        ];

        if !self.violation_history.is_empty() {
            let mut violations = list_table(&["iteration", "category", "message"]);
            for row in &self.violation_history {
                violations.add_row(vec![
                    Cell::new(row.iteration),
                    Cell::new(colorize_category(&row.category)),
                    Cell::new(truncate(&row.message, 120)),
                ]);
            }
            sections.push(format!("{}\n{violations}", "Violation History".bold()));
        }
        sections.join("\n\n")
    }
}

/// One progress line per completed stage.
pub fn render_step(snapshot: &StateSnapshot) -> String {
    format!(
        "{} {:<13} -> {}  (iteration {})",
        format!("[{}]", snapshot.step).dimmed(),
        snapshot.completed.name(),
        colorize_stage(&snapshot.next.to_string()),
        snapshot.state.iteration_count
    )
}

pub async fn execute(args: RunArgs, mut config: Config, json_mode: bool) -> Result<()> {
    if let Some(ceiling) = args.max_iterations {
        config.workflow.max_iterations = ceiling;
    }
    if !args.dry_run {
        ConfigLoader::validate(&config)?;
    }

    let orchestrator = Arc::new(build_orchestrator(&config, args.dry_run)?);
    let mut request = RunRequest::new(args.error.unwrap_or_else(default_alert));
    if let Some(session_id) = args.session_id {
        request = request.with_session_id(session_id);
    }

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, aborting at the next stage boundary");
                cancel.cancel();
            }
        })
    };

    let mut handle = orchestrator.start(request, cancel);
    if !json_mode {
        println!(
            "{} {}",
            "Starting remediation".bold(),
            handle.session_id.dimmed()
        );
    }

    let mut steps = 0;
    while let Some(snapshot) = handle.snapshots.recv().await {
        steps += 1;
        if !json_mode {
            println!("{}", render_step(&snapshot));
        }
    }
    let outcome = handle.join.await.context("Remediation task panicked")??;
    ctrl_c.abort();

    output(&RunSummary::new(&outcome, steps), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::remediation::{RemediationState, ValidationAttempt};
    use crate::domain::models::validation::{Violation, ViolationCategory};
    use crate::domain::models::workflow_state::{AbortReason, Stage};

    #[test]
    fn test_summary_keeps_history_on_abort() {
        colored::control::set_override(false);
        let mut state = RemediationState::new("boom");
        state.iteration_count = 2;
        state.root_cause_narrative = "The bug is a missing key".into();
        state.validation_history.push(ValidationAttempt {
            iteration: 2,
            violations: vec![Violation::new(ViolationCategory::Lint, "Bare 'except:' at line 3")],
        });
        let outcome = RunOutcome::new(
            "sre-1",
            Stage::Aborted {
                reason: AbortReason::ValidationExhausted,
            },
            state,
        );

        let summary = RunSummary::new(&outcome, 6);
        assert_eq!(summary.outcome, "aborted");
        assert_eq!(summary.abort_reason.as_deref(), Some("validation_exhausted"));
        assert_eq!(summary.violation_history.len(), 1);
        assert!(summary.publication_ref.is_none());

        let human = summary.to_human();
        assert!(human.contains("The bug is a missing key"));
        assert!(human.contains("Violation History"));
        assert!(human.contains("validation_exhausted"));

        let json = summary.to_json();
        assert_eq!(json["violation_history"][0]["category"], "lint");
        assert_eq!(json["steps"], 6);
    }

    #[test]
    fn test_default_alert_mentions_endpoint() {
        let alert = default_alert();
        assert!(alert.starts_with("ALERT: Application Error Detected"));
        assert!(alert.contains("/api/data"));
    }
}
