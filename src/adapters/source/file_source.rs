//! Reads the file under repair from a source root.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::CollaboratorError;
use crate::domain::ports::SourceReader;

pub struct FileSourceReader {
    root: PathBuf,
}

impl FileSourceReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }
}

#[async_trait]
impl SourceReader for FileSourceReader {
    async fn read(&self, path: &str) -> Result<String, CollaboratorError> {
        let full = self.resolve(path);
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| CollaboratorError::Io(format!("{}: {e}", full.display())))
    }
}
