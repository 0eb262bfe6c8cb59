//! Wires configured adapters into a [`RemediationOrchestrator`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::{
    FileLogSource, FileSourceReader, GitHubClient, GitHubPublisher, JsonlCheckpointStore,
    MemoryCheckpointStore, SimulatedPublisher,
};
use crate::domain::models::config::Config;
use crate::domain::ports::{CheckpointStore, Publisher};
use crate::infrastructure::llm::create_language_model;
use crate::infrastructure::retry::RetryPolicy;
use crate::services::orchestrator::{Collaborators, OrchestratorSettings, RemediationOrchestrator};

/// GitHub when a token and repository are configured, simulated otherwise.
pub fn build_publisher(config: &Config, dry_run: bool) -> Result<Arc<dyn Publisher>> {
    let github = &config.github;
    match (github.token.as_deref(), github.repo.as_deref()) {
        (Some(token), Some(repo)) if !dry_run && github.is_configured() => {
            let client = GitHubClient::new(token, repo, github.api_url.clone())
                .context("Failed to create GitHub client")?;
            info!(%repo, base = %github.base_branch, "Publishing to GitHub");
            Ok(Arc::new(GitHubPublisher::new(client, github.base_branch.clone())))
        }
        (_, repo) => {
            let mut publisher = SimulatedPublisher::new(&config.publication.output_dir);
            if let Some(owner) = repo.and_then(|r| r.split_once('/')).map(|(o, _)| o) {
                publisher = publisher.with_owner(owner);
            }
            info!(dir = %config.publication.output_dir, "GitHub not configured, simulating publication");
            Ok(Arc::new(publisher))
        }
    }
}

pub fn build_checkpoint_store(config: &Config) -> Arc<dyn CheckpointStore> {
    if config.checkpoints.enabled {
        Arc::new(JsonlCheckpointStore::new(&config.checkpoints.dir))
    } else {
        Arc::new(MemoryCheckpointStore::new())
    }
}

pub fn build_orchestrator(config: &Config, dry_run: bool) -> Result<RemediationOrchestrator> {
    let model = create_language_model(&config.llm, dry_run)?;
    info!(model = model.name(), dry_run, "Language model ready");

    let collaborators = Collaborators {
        model,
        logs: Arc::new(FileLogSource::new(&config.logs.path)),
        publisher: build_publisher(config, dry_run)?,
        source: Arc::new(FileSourceReader::new(&config.workflow.source_root)),
        checkpoints: build_checkpoint_store(config),
    };

    Ok(RemediationOrchestrator::new(
        collaborators,
        OrchestratorSettings::from_config(config),
        RetryPolicy::from_config(&config.retry),
    ))
}
