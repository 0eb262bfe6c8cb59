//! CLI type definitions

use clap::{Parser, Subcommand};

use super::commands::history::HistoryArgs;
use super::commands::logs::LogsArgs;
use super::commands::run::RunArgs;
use super::commands::validate::ValidateArgs;

#[derive(Parser, Debug)]
#[command(name = "selfheal")]
#[command(about = "Self-healing SRE agent: investigate, fix, validate, open a pull request", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a remediation for an incident
    Run(RunArgs),

    /// Validate a candidate fix without running the workflow
    Validate(ValidateArgs),

    /// Show application log lines as the investigator would fetch them
    Logs(LogsArgs),

    /// Print the effective configuration with secrets redacted
    Config,

    /// Show the checkpoints recorded for a session
    History(HistoryArgs),
}
