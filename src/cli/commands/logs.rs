//! `selfheal logs`: show what the investigator would see.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::adapters::FileLogSource;
use crate::cli::display::{output, CommandOutput};
use crate::domain::models::config::Config;
use crate::domain::ports::{LogFetch, LogSource};

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Time window: 5m, 15m, 30m, 1h, 6h, 1d
    #[arg(short, long)]
    pub window: Option<String>,

    /// Severity filter, or `all`
    #[arg(short, long)]
    pub severity: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogsOutput {
    pub path: String,
    pub window: String,
    pub severity: String,
    pub line_count: usize,
    pub text: String,
}

impl CommandOutput for LogsOutput {
    fn to_human(&self) -> String {
        self.text.clone()
    }
}

pub async fn execute(args: LogsArgs, config: &Config, json_mode: bool) -> Result<()> {
    let window = args
        .window
        .unwrap_or_else(|| config.workflow.log_window.clone());
    let severity = args
        .severity
        .unwrap_or_else(|| config.workflow.log_severity.clone());

    let fetch = FileLogSource::new(&config.logs.path)
        .fetch(&window, &severity)
        .await?;
    let line_count = match &fetch {
        LogFetch::Entries { line_count, .. } => *line_count,
        LogFetch::NoLogs(_) => 0,
    };

    output(
        &LogsOutput {
            path: config.logs.path.clone(),
            window,
            severity,
            line_count,
            text: fetch.text().to_string(),
        },
        json_mode,
    );
    Ok(())
}
