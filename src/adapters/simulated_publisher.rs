//! Local stand-in for a code host.
//!
//! Used when no GitHub token or repository is configured. The fix is saved
//! to `generated_fix_<timestamp>.py` and a `simulated://` reference is
//! returned, so a run takes the same success path as with a real host.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::adapters::github::fix_branch_name;
use crate::domain::errors::CollaboratorError;
use crate::domain::ports::{PublishReceipt, PublishRequest, Publisher};

pub struct SimulatedPublisher {
    output_dir: PathBuf,
    owner: Option<String>,
}

impl SimulatedPublisher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            owner: None,
        }
    }

    /// Use the configured repository's owner in references.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

#[async_trait]
impl Publisher for SimulatedPublisher {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, CollaboratorError> {
        let branch = fix_branch_name();
        let fix_file = self.output_dir.join(format!(
            "generated_fix_{}.py",
            Utc::now().format("%Y%m%d-%H%M%S")
        ));

        // A failed write does not fail publication.
        match tokio::fs::write(&fix_file, &request.fix_source).await {
            Ok(()) => info!(path = %fix_file.display(), "Saved simulated fix"),
            Err(err) => warn!(path = %fix_file.display(), error = %err, "Could not save simulated fix"),
        }

        let owner = self.owner.as_deref().unwrap_or("local");
        let reference = format!("simulated://{owner}/pull/{branch}");
        info!(title = %request.title, file = %request.target_path, %reference, "Simulated pull request");

        Ok(PublishReceipt {
            ok: true,
            reference,
        })
    }
}
