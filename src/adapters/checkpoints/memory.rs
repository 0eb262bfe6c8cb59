//! In-memory checkpoint store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::snapshot::StateSnapshot;
use crate::domain::ports::CheckpointStore;

#[derive(Default)]
pub struct MemoryCheckpointStore {
    sessions: RwLock<HashMap<String, Vec<StateSnapshot>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, snapshot: &StateSnapshot) -> DomainResult<()> {
        self.sessions
            .write()
            .await
            .entry(snapshot.session_id.clone())
            .or_default()
            .push(snapshot.clone());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> DomainResult<Vec<StateSnapshot>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn sessions(&self) -> DomainResult<Vec<String>> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
