//! Log source backed by the application's log file.
//!
//! The window token maps to a line budget rather than a timestamp filter:
//! the newest matching lines within the budget are returned.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::errors::CollaboratorError;
use crate::domain::ports::{LogFetch, LogSource};

/// Line budget used for windows not in [`line_limit`]'s table.
pub const DEFAULT_LINE_LIMIT: usize = 100;

/// Maximum number of lines returned for a window token.
pub fn line_limit(window: &str) -> usize {
    match window {
        "5m" => 10,
        "15m" => 30,
        "30m" => 50,
        "1h" => 100,
        "6h" => 300,
        "1d" => 500,
        _ => DEFAULT_LINE_LIMIT,
    }
}

pub struct FileLogSource {
    path: PathBuf,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn select<'a>(content: &'a str, window: &str, severity: &str) -> Vec<&'a str> {
        let level = severity.to_uppercase();
        let matching: Vec<&str> = if severity.eq_ignore_ascii_case("all") {
            content.lines().collect()
        } else {
            content
                .lines()
                .filter(|line| line.contains(&level) || line.contains("CRITICAL"))
                .collect()
        };
        let limit = line_limit(window);
        let skip = matching.len().saturating_sub(limit);
        matching.into_iter().skip(skip).collect()
    }
}

#[async_trait]
impl LogSource for FileLogSource {
    async fn fetch(&self, window: &str, severity: &str) -> Result<LogFetch, CollaboratorError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LogFetch::NoLogs(format!(
                    "No logs found. {} does not exist; the application may not have been \
                     started yet, or no errors have occurred.",
                    self.path.display()
                )));
            }
            Err(err) => return Err(err.into()),
        };

        if content.trim().is_empty() {
            return Ok(LogFetch::NoLogs(
                "Log file is empty. No errors have been recorded yet.".to_string(),
            ));
        }

        let lines = Self::select(&content, window, severity);
        debug!(window, severity, lines = lines.len(), "Selected log lines");
        if lines.is_empty() {
            return Ok(LogFetch::NoLogs(format!(
                "No logs found with severity '{severity}' in the last {window}."
            )));
        }

        let text = format!(
            "=== Application Logs (Last {window}, Severity: {severity}) ===\n\n{}\n\n\
             === End of Logs ===\n\nTotal lines returned: {}\n",
            lines.join("\n"),
            lines.len()
        );
        Ok(LogFetch::Entries {
            text,
            line_count: lines.len(),
        })
    }
}
