//! Groq chat-completions client (OpenAI-compatible API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::errors::CollaboratorError;
use crate::domain::models::remediation::Role;
use crate::domain::ports::{LanguageModel, ModelReply, Prompt, ToolCall, ToolKind};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Configuration for the Groq client
#[derive(Debug, Clone)]
pub struct GroqClientConfig {
    pub api_key: String,
    pub model: String,
    /// Base URL for the API (for testing/proxies)
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GroqClientConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ToolSpec {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionSpec,
}

#[derive(Debug, Serialize)]
struct FunctionSpec {
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    /// JSON-encoded argument object.
    #[serde(default)]
    arguments: String,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::Assistant => "assistant",
        Role::User | Role::Tool => "user",
    }
}

/// Groq API client
pub struct GroqClient {
    http_client: ReqwestClient,
    config: GroqClientConfig,
}

impl GroqClient {
    pub fn new(config: GroqClientConfig) -> Result<Self, CollaboratorError> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CollaboratorError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    fn build_request<'a>(&'a self, prompt: &Prompt, tools: &[ToolKind]) -> ChatRequest<'a> {
        let mut messages = vec![ChatMessage {
            role: "system",
            content: prompt.system.clone(),
        }];
        messages.extend(prompt.turns.iter().map(|t| ChatMessage {
            role: role_name(t.role),
            content: t.content.clone(),
        }));

        let tools: Vec<ToolSpec> = tools
            .iter()
            .map(|k| ToolSpec {
                kind: "function",
                function: FunctionSpec {
                    name: k.name(),
                    description: k.description(),
                    parameters: k.parameters_schema(),
                },
            })
            .collect();
        let tool_choice = (!tools.is_empty()).then_some("auto");

        ChatRequest {
            model: &self.config.model,
            temperature: prompt.temperature,
            messages,
            tools,
            tool_choice,
        }
    }
}

#[async_trait]
impl LanguageModel for GroqClient {
    fn name(&self) -> &'static str {
        "groq"
    }

    #[instrument(skip_all, fields(model = %self.config.model, kind = ?prompt.kind))]
    async fn invoke(
        &self,
        prompt: &Prompt,
        tools: &[ToolKind],
    ) -> Result<ModelReply, CollaboratorError> {
        let request = self.build_request(prompt, tools);
        let response = self
            .http_client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(CollaboratorError::from_status(status, body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::MalformedResponse(e.to_string()))?;
        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| CollaboratorError::MalformedResponse("no choices".to_string()))?;

        let text = message.content.unwrap_or_default();
        match message.tool_calls.into_iter().next() {
            Some(call) => {
                let args: Value = if call.function.arguments.trim().is_empty() {
                    Value::Object(serde_json::Map::new())
                } else {
                    serde_json::from_str(&call.function.arguments).map_err(|e| {
                        CollaboratorError::MalformedResponse(format!("tool arguments: {e}"))
                    })?
                };
                let call = ToolCall::parse(&call.function.name, &args)?;
                debug!(tool = call.kind().name(), "Model requested tool");
                Ok(ModelReply::ToolRequest {
                    call,
                    preamble: text,
                })
            }
            None => Ok(ModelReply::Answer(text)),
        }
    }
}
