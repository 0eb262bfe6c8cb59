//! Log retrieval port.

use async_trait::async_trait;

use crate::domain::errors::CollaboratorError;

/// Result of a log query. Absence of logs is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFetch {
    Entries { text: String, line_count: usize },
    NoLogs(String),
}

impl LogFetch {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NoLogs(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Entries { text, .. } => text,
            Self::NoLogs(reason) => reason,
        }
    }
}

#[async_trait]
pub trait LogSource: Send + Sync {
    /// Most recent lines in `window` (e.g. `1h`) matching `severity`.
    async fn fetch(&self, window: &str, severity: &str) -> Result<LogFetch, CollaboratorError>;
}
