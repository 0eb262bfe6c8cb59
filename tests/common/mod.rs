//! Common test utilities for integration tests
//!
//! Fixtures for the file under repair, collaborator doubles, and helpers
//! for assembling an orchestrator around them.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use selfheal::adapters::{MemoryCheckpointStore, ScriptedModel};
use selfheal::domain::errors::CollaboratorError;
use selfheal::domain::ports::{
    LanguageModel, LogFetch, LogSource, PublishReceipt, PublishRequest, Publisher, SourceReader,
};
use selfheal::infrastructure::retry::RetryPolicy;
use selfheal::services::{Collaborators, OrchestratorSettings, RemediationOrchestrator};
use tempfile::TempDir;
use tokio::sync::Mutex;

/// Buggy service under repair.
pub const ORIGINAL_APP: &str = r#"import logging

logger = logging.getLogger(__name__)


def get_data(request):
    config = request.headers
    return config["user_config"]["api_key"]


def health():
    return {"status": "ok"}
"#;

/// Correct fix preserving every routine.
pub const FIXED_APP: &str = r#"import logging

logger = logging.getLogger(__name__)


def get_data(request):
    config = request.headers
    # Missing keys fall back to None instead of raising KeyError
    return config.get("user_config", {}).get("api_key")


def health():
    return {"status": "ok"}
"#;

/// Fix that hides the error behind a bare `except:`.
pub const BARE_EXCEPT_FIX: &str = r#"import logging

logger = logging.getLogger(__name__)


def get_data(request):
    try:
        return request.headers["user_config"]["api_key"]
    except:
        return None


def health():
    return {"status": "ok"}
"#;

pub const ERROR_LOGS: &str = "2024-05-01 10:00:00 INFO Started\n\
2024-05-01 10:00:01 ERROR KeyError: 'user_config' in get_data\n";

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn python_fence(code: &str) -> String {
    format!("Here is the fix:\n```python\n{code}```\n")
}

/// Source reader returning a fixed string.
pub struct StaticSource(pub &'static str);

#[async_trait]
impl SourceReader for StaticSource {
    async fn read(&self, _path: &str) -> Result<String, CollaboratorError> {
        Ok(self.0.to_string())
    }
}

/// Log source returning a fixed fetch and counting calls.
pub struct StaticLogs {
    fetch: LogFetch,
    pub calls: AtomicUsize,
}

impl StaticLogs {
    pub fn entries(text: &str) -> Self {
        Self {
            fetch: LogFetch::Entries {
                text: text.to_string(),
                line_count: text.lines().count(),
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            fetch: LogFetch::NoLogs("No logs found in the specified time range".into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogSource for StaticLogs {
    async fn fetch(&self, _window: &str, _severity: &str) -> Result<LogFetch, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.fetch.clone())
    }
}

/// Publisher recording requests; fails with `error` when set.
#[derive(Default)]
pub struct RecordingPublisher {
    pub requests: Mutex<Vec<PublishRequest>>,
    pub error: Option<CollaboratorError>,
}

impl RecordingPublisher {
    pub fn failing(error: CollaboratorError) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            error: Some(error),
        }
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, CollaboratorError> {
        self.requests.lock().await.push(request.clone());
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(PublishReceipt {
                ok: true,
                reference: "https://github.example/acme/shop/pull/1".into(),
            }),
        }
    }
}

pub struct Harness {
    pub model: Arc<ScriptedModel>,
    pub logs: Arc<StaticLogs>,
    pub publisher: Arc<RecordingPublisher>,
    pub checkpoints: Arc<MemoryCheckpointStore>,
}

impl Harness {
    pub fn new(model: ScriptedModel, logs: StaticLogs, publisher: RecordingPublisher) -> Self {
        Self {
            model: Arc::new(model),
            logs: Arc::new(logs),
            publisher: Arc::new(publisher),
            checkpoints: Arc::new(MemoryCheckpointStore::new()),
        }
    }

    pub fn orchestrator(&self, max_iterations: u32) -> RemediationOrchestrator {
        self.orchestrator_with_retry(max_iterations, RetryPolicy::none())
    }

    pub fn orchestrator_with_retry(
        &self,
        max_iterations: u32,
        retry: RetryPolicy,
    ) -> RemediationOrchestrator {
        let model: Arc<dyn LanguageModel> = self.model.clone();
        RemediationOrchestrator::new(
            Collaborators {
                model,
                logs: self.logs.clone(),
                publisher: self.publisher.clone(),
                source: Arc::new(StaticSource(ORIGINAL_APP)),
                checkpoints: self.checkpoints.clone(),
            },
            OrchestratorSettings {
                max_iterations,
                ..OrchestratorSettings::default()
            },
            retry,
        )
    }
}
