//! `selfheal validate`: run the static gate over a candidate file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::display::{action_failure, action_success, colorize_category, CommandOutput, output};
use crate::domain::models::validation::ValidationReport;
use crate::services::fix_validator::FixValidator;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Candidate source file
    pub candidate: PathBuf,

    /// Original source; enables the function-preservation check
    #[arg(long)]
    pub original: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub candidate: PathBuf,
    #[serde(flatten)]
    pub report: ValidationReport,
    pub summary: String,
}

impl CommandOutput for ValidateOutput {
    fn to_human(&self) -> String {
        if self.report.passed {
            return action_success(&self.summary);
        }
        let mut lines = vec![action_failure(&self.summary)];
        lines.extend(self.report.violations.iter().map(|v| {
            format!("  [{}] {}", colorize_category(v.category.as_str()), v.message)
        }));
        lines.join("\n")
    }
}

pub async fn execute(args: ValidateArgs, json_mode: bool) -> Result<()> {
    let candidate = tokio::fs::read_to_string(&args.candidate)
        .await
        .with_context(|| format!("Failed to read candidate {}", args.candidate.display()))?;
    let original = match &args.original {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read original {}", path.display()))?,
        ),
        None => None,
    };

    let report = FixValidator::new().validate(&candidate, original.as_deref());
    let result = ValidateOutput {
        candidate: args.candidate,
        summary: report.summary(),
        report,
    };
    output(&result, json_mode);

    if !result.report.passed {
        anyhow::bail!(result.summary);
    }
    Ok(())
}
