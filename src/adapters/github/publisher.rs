//! Publisher that opens a GitHub pull request for a validated fix.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::domain::errors::CollaboratorError;
use crate::domain::ports::{PublishReceipt, PublishRequest, Publisher};

use super::client::GitHubClient;
use super::models::GitTreeEntry;

/// Branch name for a fix created now: `fix/sre-agent-<YYYYmmdd-HHMMSS>`.
pub fn fix_branch_name() -> String {
    format!("fix/sre-agent-{}", Utc::now().format("%Y%m%d-%H%M%S"))
}

pub struct GitHubPublisher {
    client: GitHubClient,
    base_branch: String,
}

impl GitHubPublisher {
    pub fn new(client: GitHubClient, base_branch: impl Into<String>) -> Self {
        Self {
            client,
            base_branch: base_branch.into(),
        }
    }
}

#[async_trait]
impl Publisher for GitHubPublisher {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, CollaboratorError> {
        let branch = fix_branch_name();

        let base_sha = self.client.branch_head(&self.base_branch).await?;
        let base_commit = self.client.get_commit(&base_sha).await?;
        debug!(base = %self.base_branch, sha = %base_sha, "Resolved base commit");

        let tree = self
            .client
            .create_tree(
                &base_commit.tree.sha,
                vec![GitTreeEntry::file(&request.target_path, &request.fix_source)],
            )
            .await?;
        let commit = self
            .client
            .create_commit(&format!("Fix: {}", request.title), &tree, &base_sha)
            .await?;
        self.client.create_branch(&branch, &commit).await?;

        let pr = self
            .client
            .create_pull_request(&request.title, &request.description, &branch, &self.base_branch)
            .await?;
        info!(number = pr.number, url = %pr.html_url, %branch, "Pull request opened");

        Ok(PublishReceipt {
            ok: true,
            reference: pr.html_url,
        })
    }
}
