//! Language model port.
//!
//! A model either answers directly or asks for one of a fixed set of tool
//! calls. Tool names coming back from a provider are resolved against
//! [`ToolKind`] only; anything else is a malformed response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::errors::CollaboratorError;
use crate::domain::models::remediation::{Role, Turn};

/// Tools a model is permitted to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    FetchLogs,
}

impl ToolKind {
    pub const ALL: [Self; 1] = [Self::FetchLogs];

    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchLogs => "fetch_logs",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::FetchLogs => {
                "Fetch recent application logs. Use this to retrieve error logs and stack traces."
            }
        }
    }

    /// JSON schema of the tool's parameters.
    pub fn parameters_schema(&self) -> Value {
        match self {
            Self::FetchLogs => json!({
                "type": "object",
                "properties": {
                    "time_range": {
                        "type": "string",
                        "description": "Time range for logs, e.g. 5m, 15m, 30m, 1h, 6h, 1d"
                    },
                    "severity": {
                        "type": "string",
                        "description": "Severity filter: error, warning, info, or all"
                    }
                }
            }),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// A concrete tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolCall {
    FetchLogs {
        window: Option<String>,
        severity: Option<String>,
    },
}

impl ToolCall {
    /// Resolve a provider's tool name and JSON arguments.
    pub fn parse(name: &str, args: &Value) -> Result<Self, CollaboratorError> {
        let kind = ToolKind::from_name(name).ok_or_else(|| {
            CollaboratorError::MalformedResponse(format!("model requested unknown tool: {name}"))
        })?;
        let text = |key: &str| args.get(key).and_then(Value::as_str).map(str::to_string);
        match kind {
            ToolKind::FetchLogs => Ok(Self::FetchLogs {
                window: text("time_range"),
                severity: text("severity"),
            }),
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Self::FetchLogs { .. } => ToolKind::FetchLogs,
        }
    }
}

/// Which step of a run a prompt belongs to.
///
/// Providers ignore it; scripted models use it to pick a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// First investigation call, with the log tool offered.
    Investigation,
    /// Second investigation call, carrying retrieved logs.
    LogAnalysis,
    FixGeneration,
}

/// A request to the model: system instructions plus conversation turns.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub system: String,
    pub turns: Vec<Turn>,
    pub temperature: f32,
}

impl Prompt {
    pub fn new(kind: PromptKind, system: impl Into<String>) -> Self {
        Self {
            kind,
            system: system.into(),
            turns: Vec::new(),
            temperature: 0.0,
        }
    }

    pub fn with_turns(mut self, turns: impl IntoIterator<Item = Turn>) -> Self {
        self.turns.extend(turns);
        self
    }

    pub fn with_user(mut self, content: impl Into<String>) -> Self {
        self.turns.push(Turn::user(content));
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Concatenated text of every user turn; handy for scripted doubles.
    pub fn user_text(&self) -> String {
        self.turns
            .iter()
            .filter(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The model's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    Answer(String),
    ToolRequest { call: ToolCall, preamble: String },
}

impl ModelReply {
    /// Text of the reply; for a tool request this is whatever the model said alongside it.
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(text) => text,
            Self::ToolRequest { preamble, .. } => preamble,
        }
    }
}

/// Opaque text-generation capability.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Generate a reply, optionally offering the given tools.
    async fn invoke(
        &self,
        prompt: &Prompt,
        tools: &[ToolKind],
    ) -> Result<ModelReply, CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch_logs() {
        let call = ToolCall::parse("fetch_logs", &json!({"time_range": "30m"})).unwrap();
        assert_eq!(
            call,
            ToolCall::FetchLogs {
                window: Some("30m".into()),
                severity: None
            }
        );
        assert_eq!(call.kind(), ToolKind::FetchLogs);
    }

    #[test]
    fn test_unknown_tool_is_malformed() {
        let err = ToolCall::parse("rm_rf", &json!({})).unwrap_err();
        assert!(matches!(err, CollaboratorError::MalformedResponse(_)));
    }

    #[test]
    fn test_prompt_user_text() {
        let prompt = Prompt::new(PromptKind::FixGeneration, "sys").with_user("a").with_user("b");
        assert_eq!(prompt.user_text(), "a\nb");
    }
}
