//! Read access to the source file under repair.

use async_trait::async_trait;

use crate::domain::errors::CollaboratorError;

#[async_trait]
pub trait SourceReader: Send + Sync {
    async fn read(&self, path: &str) -> Result<String, CollaboratorError>;
}
