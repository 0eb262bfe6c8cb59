use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid LLM provider: {0}. Must be one of: groq, gemini")]
    InvalidProvider(String),

    #[error("Missing API key for provider '{0}'. Set {1}")]
    MissingApiKey(String, &'static str),

    #[error("Invalid max_iterations: {0}. Must be at least 1")]
    InvalidMaxIterations(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid GitHub repository: {0:?}. Must be owner/name")]
    InvalidRepository(String),

    #[error("Target path cannot be empty")]
    EmptyTargetPath,
}

/// Conventional variable names and the keys they override.
const CONVENTIONAL_ENV: &[(&str, &str)] = &[
    ("llm_provider", "llm.provider"),
    ("groq_api_key", "llm.groq.api_key"),
    ("groq_model", "llm.groq.model"),
    ("gemini_api_key", "llm.gemini.api_key"),
    ("gemini_model", "llm.gemini.model"),
    ("github_token", "github.token"),
    ("github_repo", "github.repo"),
    ("github_branch", "github.base_branch"),
    ("log_file", "logs.path"),
    ("max_iterations", "workflow.max_iterations"),
];

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .selfheal/config.yaml
    /// 3. .selfheal/local.yaml
    /// 4. SELFHEAL_* environment variables, `__` separating nested keys
    /// 5. Conventional variables such as GROQ_API_KEY and GITHUB_TOKEN
    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".selfheal/config.yaml"))
            .merge(Yaml::file(".selfheal/local.yaml"))
            .merge(Env::prefixed("SELFHEAL_").split("__"))
            .merge(Env::raw().filter_map(|key| {
                CONVENTIONAL_ENV
                    .iter()
                    .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
                    .map(|(_, path)| (*path).into())
            }))
    }

    /// Load and fully validate, including model credentials.
    pub fn load() -> Result<Config> {
        let config = Self::load_unvalidated()?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load and validate everything except model credentials.
    ///
    /// Used by commands that never call a model (dry runs, `validate`, `logs`).
    pub fn load_offline() -> Result<Config> {
        let config = Self::load_unvalidated()?;
        Self::validate_structure(&config)?;
        Ok(config)
    }

    fn load_unvalidated() -> Result<Config> {
        Self::figment()
            .extract()
            .context("Failed to extract configuration from figment")
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Full validation: structure plus an API key for the selected provider.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_structure(config)?;

        let key_var = match config.llm.provider.as_str() {
            "gemini" => "GEMINI_API_KEY",
            _ => "GROQ_API_KEY",
        };
        let has_key = config
            .llm
            .selected()
            .and_then(|p| p.api_key.as_deref())
            .is_some_and(|k| !k.trim().is_empty());
        if !has_key {
            return Err(ConfigError::MissingApiKey(
                config.llm.provider.clone(),
                key_var,
            ));
        }

        Ok(())
    }

    pub fn validate_structure(config: &Config) -> Result<(), ConfigError> {
        if config.llm.selected().is_none() {
            return Err(ConfigError::InvalidProvider(config.llm.provider.clone()));
        }

        if config.workflow.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(0));
        }

        if config.workflow.target_path.trim().is_empty() {
            return Err(ConfigError::EmptyTargetPath);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.retry.max_retries));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if let Some(repo) = config.github.repo.as_deref() {
            let well_formed = repo
                .split_once('/')
                .is_some_and(|(o, r)| !o.is_empty() && !r.is_empty() && !r.contains('/'));
            if !well_formed {
                return Err(ConfigError::InvalidRepository(repo.to_string()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::RetryConfig;

    fn keyed() -> Config {
        let mut config = Config::default();
        config.llm.groq.api_key = Some("gsk-test".to_string());
        config
    }

    #[test]
    fn test_default_config_needs_only_a_key() {
        let config = Config::default();
        assert!(ConfigLoader::validate_structure(&config).is_ok());
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::MissingApiKey("groq".into(), "GROQ_API_KEY"))
        );
        assert!(ConfigLoader::validate(&keyed()).is_ok());
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
llm:
  provider: gemini
  temperature: 0.2
  gemini:
    api_key: g-key
    model: gemini-1.5-pro
workflow:
  max_iterations: 5
  target_path: service/app.py
github:
  token: ghp_x
  repo: acme/shop
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.llm.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.llm.groq.model, "llama-3.1-70b-versatile");
        assert_eq!(config.workflow.max_iterations, 5);
        assert_eq!(config.workflow.log_window, "1h");
        assert!(config.github.is_configured());
        assert_eq!(config.github.base_branch, "main");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_rejects_unknown_provider() {
        let mut config = keyed();
        config.llm.provider = "openai".into();
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidProvider("openai".into()))
        );
    }

    #[test]
    fn test_validate_zero_iterations() {
        let mut config = keyed();
        config.workflow.max_iterations = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxIterations(0))
        );
    }

    #[test]
    fn test_validate_logging() {
        let mut config = keyed();
        config.logging.level = "verbose".into();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));

        let mut config = keyed();
        config.logging.format = "xml".into();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_validate_retry() {
        let mut config = keyed();
        config.retry = RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        };
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxRetries(0))
        );

        config.retry = RetryConfig {
            max_retries: 2,
            initial_backoff_ms: 10_000,
            max_backoff_ms: 10_000,
        };
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff(10_000, 10_000))
        );
    }

    #[test]
    fn test_validate_repository_shape() {
        for bad in ["shop", "acme/", "a/b/c"] {
            let mut config = keyed();
            config.github.repo = Some(bad.into());
            assert_eq!(
                ConfigLoader::validate(&config),
                Err(ConfigError::InvalidRepository(bad.into()))
            );
        }
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults_then_validates() {
        let err = ConfigLoader::load_from_file("/nonexistent/selfheal.yaml").unwrap_err();
        assert!(err.to_string().contains("Missing API key"));
    }
}
