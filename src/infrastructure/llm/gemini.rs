//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::errors::CollaboratorError;
use crate::domain::models::remediation::Role;
use crate::domain::ports::{LanguageModel, ModelReply, Prompt, ToolCall, ToolKind};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the Gemini client
#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    pub api_key: String,
    pub model: String,
    /// Base URL for the API (for testing/proxies)
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GeminiClientConfig {
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
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDeclarations>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDeclarations {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

fn text_part(text: impl Into<String>) -> Part {
    Part {
        text: Some(text.into()),
        function_call: None,
    }
}

/// Gemini API client
pub struct GeminiClient {
    http_client: ReqwestClient,
    config: GeminiClientConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiClientConfig) -> Result<Self, CollaboratorError> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CollaboratorError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    fn build_request(prompt: &Prompt, tools: &[ToolKind]) -> GenerateRequest {
        let contents = prompt
            .turns
            .iter()
            .filter(|t| t.role != Role::System)
            .map(|t| Content {
                role: Some(if t.role == Role::Assistant { "model" } else { "user" }.to_string()),
                parts: vec![text_part(t.content.clone())],
            })
            .collect();

        let tools = if tools.is_empty() {
            Vec::new()
        } else {
            vec![ToolDeclarations {
                function_declarations: tools
                    .iter()
                    .map(|k| FunctionDeclaration {
                        name: k.name(),
                        description: k.description(),
                        parameters: k.parameters_schema(),
                    })
                    .collect(),
            }]
        };

        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![text_part(prompt.system.clone())],
            },
            contents,
            tools,
            generation_config: GenerationConfig {
                temperature: prompt.temperature,
            },
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    #[instrument(skip_all, fields(model = %self.config.model, kind = ?prompt.kind))]
    async fn invoke(
        &self,
        prompt: &Prompt,
        tools: &[ToolKind],
    ) -> Result<ModelReply, CollaboratorError> {
        let request = Self::build_request(prompt, tools);
        let response = self
            .http_client
            .post(format!(
                "{}/models/{}:generateContent",
                self.config.base_url.trim_end_matches('/'),
                self.config.model
            ))
            .header("x-goog-api-key", &self.config.api_key)
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

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::MalformedResponse(e.to_string()))?;
        let content = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content)
            .ok_or_else(|| CollaboratorError::MalformedResponse("no candidates".to_string()))?;

        let mut text = String::new();
        let mut requested = None;
        for part in content.parts {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if requested.is_none() {
                requested = part.function_call;
            }
        }

        match requested {
            Some(call) => {
                let call = ToolCall::parse(&call.name, &call.args)?;
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
