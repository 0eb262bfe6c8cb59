//! Scripted language model for tests and dry runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::errors::CollaboratorError;
use crate::domain::ports::{LanguageModel, ModelReply, Prompt, PromptKind, ToolCall, ToolKind};

type Responder =
    dyn Fn(&Prompt, &[ToolKind]) -> Result<ModelReply, CollaboratorError> + Send + Sync;

/// One invocation seen by a [`ScriptedModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub kind: PromptKind,
    pub system: String,
    pub user_text: String,
    pub tools: Vec<ToolKind>,
}

/// Scripted model.
///
/// Replies are taken from the script in order; once it runs out the
/// responder (if any) answers. Without either, the call fails.
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<ModelReply, CollaboratorError>>>,
    responder: Option<Arc<Responder>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new(replies: impl IntoIterator<Item = Result<ModelReply, CollaboratorError>>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            responder: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A model answering every call through `responder`.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&Prompt, &[ToolKind]) -> Result<ModelReply, CollaboratorError> + Send + Sync + 'static,
    {
        let responder: Arc<Responder> = Arc::new(responder);
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: Some(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Deterministic model for `--dry-run`.
    ///
    /// Asks for logs, reports the last logged error line as the root cause,
    /// and proposes the original source unchanged as the fix.
    pub fn dry_run() -> Self {
        Self::from_fn(|prompt, tools| {
            let reply = match prompt.kind {
                PromptKind::Investigation if tools.contains(&ToolKind::FetchLogs) => {
                    ModelReply::ToolRequest {
                        call: ToolCall::FetchLogs {
                            window: None,
                            severity: None,
                        },
                        preamble: "Fetching recent error logs.".to_string(),
                    }
                }
                PromptKind::Investigation | PromptKind::LogAnalysis => {
                    let text = prompt.user_text();
                    let evidence = text
                        .lines()
                        .rev()
                        .find(|l| l.contains("ERROR") || l.contains("CRITICAL"))
                        .unwrap_or("no error lines in the retrieved logs")
                        .trim();
                    ModelReply::Answer(format!(
                        "Root cause (dry run): the most recent failure is `{evidence}`."
                    ))
                }
                PromptKind::FixGeneration => {
                    let text = prompt.user_text();
                    let code = text
                        .split("```python")
                        .nth(1)
                        .and_then(|rest| rest.split("```").next())
                        .unwrap_or_default()
                        .trim();
                    ModelReply::Answer(format!("```python\n{code}\n```"))
                }
            };
            Ok(reply)
        })
    }

    pub fn answer(text: impl Into<String>) -> Result<ModelReply, CollaboratorError> {
        Ok(ModelReply::Answer(text.into()))
    }

    pub fn fetch_logs(window: &str, severity: &str) -> Result<ModelReply, CollaboratorError> {
        Ok(ModelReply::ToolRequest {
            call: ToolCall::FetchLogs {
                window: Some(window.to_string()),
                severity: Some(severity.to_string()),
            },
            preamble: String::new(),
        })
    }

    /// Every call received so far.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// Script entries not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn invoke(
        &self,
        prompt: &Prompt,
        tools: &[ToolKind],
    ) -> Result<ModelReply, CollaboratorError> {
        self.calls.lock().await.push(RecordedCall {
            kind: prompt.kind,
            system: prompt.system.clone(),
            user_text: prompt.user_text(),
            tools: tools.to_vec(),
        });

        if let Some(reply) = self.script.lock().await.pop_front() {
            return reply;
        }
        match &self.responder {
            Some(responder) => responder(prompt, tools),
            None => Err(CollaboratorError::InvalidRequest(
                "scripted model has no reply left".to_string(),
            )),
        }
    }
}
