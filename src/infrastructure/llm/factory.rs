//! Builds the configured [`LanguageModel`].

use std::sync::Arc;

use thiserror::Error;

use crate::adapters::ScriptedModel;
use crate::domain::errors::CollaboratorError;
use crate::domain::models::config::LlmConfig;
use crate::domain::ports::LanguageModel;

use super::gemini::{GeminiClient, GeminiClientConfig};
use super::groq::{GroqClient, GroqClientConfig};

#[derive(Debug, Error)]
pub enum ModelFactoryError {
    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),

    #[error("No API key configured for provider '{0}'")]
    MissingApiKey(String),

    #[error("Failed to build {provider} client: {source}")]
    Client {
        provider: String,
        #[source]
        source: CollaboratorError,
    },
}

/// Create the model selected by `config.provider`.
///
/// With `dry_run` the network is never touched and a [`ScriptedModel::dry_run`]
/// stands in for the provider.
pub fn create_language_model(
    config: &LlmConfig,
    dry_run: bool,
) -> Result<Arc<dyn LanguageModel>, ModelFactoryError> {
    if dry_run {
        return Ok(Arc::new(ScriptedModel::dry_run()));
    }

    let provider = config
        .selected()
        .ok_or_else(|| ModelFactoryError::UnknownProvider(config.provider.clone()))?;
    let api_key = provider
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ModelFactoryError::MissingApiKey(config.provider.clone()))?;
    let client_error = |source: CollaboratorError| ModelFactoryError::Client {
        provider: config.provider.clone(),
        source,
    };

    match config.provider.as_str() {
        "gemini" => {
            let mut client_config = GeminiClientConfig::new(api_key, provider.model.clone());
            if let Some(url) = &provider.base_url {
                client_config.base_url = url.clone();
            }
            client_config.timeout_secs = config.timeout_secs;
            Ok(Arc::new(GeminiClient::new(client_config).map_err(client_error)?))
        }
        _ => {
            let mut client_config = GroqClientConfig::new(api_key, provider.model.clone());
            if let Some(url) = &provider.base_url {
                client_config.base_url = url.clone();
            }
            client_config.timeout_secs = config.timeout_secs;
            Ok(Arc::new(GroqClient::new(client_config).map_err(client_error)?))
        }
    }
}
