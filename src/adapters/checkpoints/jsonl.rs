//! Checkpoint store writing one `<session>.jsonl` file per run.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::snapshot::{is_valid_session_id, StateSnapshot};
use crate::domain::ports::CheckpointStore;

pub struct JsonlCheckpointStore {
    dir: PathBuf,
}

impl JsonlCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, session_id: &str) -> DomainResult<PathBuf> {
        if !is_valid_session_id(session_id) {
            return Err(DomainError::Checkpoint(format!(
                "invalid session id: {session_id:?}"
            )));
        }
        Ok(self.dir.join(format!("{session_id}.jsonl")))
    }
}

fn io_error(context: &str, path: &Path, err: &std::io::Error) -> DomainError {
    DomainError::Checkpoint(format!("{context} {}: {err}", path.display()))
}

#[async_trait]
impl CheckpointStore for JsonlCheckpointStore {
    async fn save(&self, snapshot: &StateSnapshot) -> DomainResult<()> {
        let path = self.session_path(&snapshot.session_id)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error("failed to create", &self.dir, &e))?;

        let mut line = serde_json::to_string(snapshot)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| io_error("failed to open", &path, &e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| io_error("failed to write", &path, &e))?;
        file.flush()
            .await
            .map_err(|e| io_error("failed to flush", &path, &e))?;
        Ok(())
    }

    async fn load(&self, session_id: &str) -> DomainResult<Vec<StateSnapshot>> {
        let path = self.session_path(session_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(DomainError::SessionNotFound(session_id.to_string()))
            }
            Err(err) => return Err(io_error("failed to read", &path, &err)),
        };

        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(DomainError::from))
            .collect()
    }

    async fn sessions(&self) -> DomainResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error("failed to list", &self.dir, &err)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("failed to list", &self.dir, &e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
