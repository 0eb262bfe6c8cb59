//! Change-request publication port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::CollaboratorError;

/// Longest title a change request is given.
pub const MAX_TITLE_CHARS: usize = 72;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub title: String,
    pub description: String,
    pub fix_source: String,
    pub target_path: String,
}

impl PublishRequest {
    /// Build a request, truncating the title to [`MAX_TITLE_CHARS`] on a char boundary.
    pub fn new(
        title: &str,
        description: impl Into<String>,
        fix_source: impl Into<String>,
        target_path: impl Into<String>,
    ) -> Self {
        Self {
            title: truncate_title(title),
            description: description.into(),
            fix_source: fix_source.into(),
            target_path: target_path.into(),
        }
    }
}

pub fn truncate_title(title: &str) -> String {
    title.chars().take(MAX_TITLE_CHARS).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub ok: bool,
    /// URL, simulated handle, or failure description.
    pub reference: String,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, CollaboratorError>;
}
