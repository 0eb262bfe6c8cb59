//! Persistence of per-stage snapshots, keyed by session id.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::snapshot::StateSnapshot;

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, snapshot: &StateSnapshot) -> DomainResult<()>;

    /// All snapshots for a session in the order they were saved.
    async fn load(&self, session_id: &str) -> DomainResult<Vec<StateSnapshot>>;

    /// Known session ids.
    async fn sessions(&self) -> DomainResult<Vec<String>>;
}
