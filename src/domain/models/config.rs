use serde::{Deserialize, Serialize};

/// Main configuration structure for selfheal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Language model provider configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Code hosting configuration used to open pull requests
    #[serde(default)]
    pub github: GitHubConfig,

    /// Remediation workflow configuration
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Application log source configuration
    #[serde(default)]
    pub logs: LogSourceConfig,

    /// Retry policy for collaborator calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration for selfheal itself
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-run checkpoint persistence
    #[serde(default)]
    pub checkpoints: CheckpointConfig,

    /// Local publication fallback
    #[serde(default)]
    pub publication: PublicationConfig,
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    /// Provider: groq or gemini
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Per-request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "ProviderConfig::groq")]
    pub groq: ProviderConfig,

    #[serde(default = "ProviderConfig::gemini")]
    pub gemini: ProviderConfig,
}

fn default_provider() -> String {
    "groq".to_string()
}

const fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            temperature: 0.0,
            timeout_secs: default_llm_timeout(),
            groq: ProviderConfig::groq(),
            gemini: ProviderConfig::gemini(),
        }
    }
}

impl LlmConfig {
    /// Settings for the selected provider, if the name is known.
    pub fn selected(&self) -> Option<&ProviderConfig> {
        match self.provider.as_str() {
            "groq" => Some(&self.groq),
            "gemini" => Some(&self.gemini),
            _ => None,
        }
    }
}

/// Settings for a single model provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderConfig {
    /// API key (GROQ_API_KEY / GEMINI_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// Base URL for API (for testing/proxies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn groq() -> Self {
        Self {
            api_key: None,
            model: "llama-3.1-70b-versatile".to_string(),
            base_url: None,
        }
    }

    pub fn gemini() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            base_url: None,
        }
    }
}

/// GitHub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GitHubConfig {
    /// Personal access token; unset means simulated publication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Repository in `owner/name` form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Branch pull requests are opened against
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// API base URL
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            repo: None,
            base_branch: default_base_branch(),
            api_url: default_github_api_url(),
        }
    }
}

impl GitHubConfig {
    /// Whether both a token and a repository are configured.
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.token) && present(&self.repo)
    }
}

/// Remediation workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowConfig {
    /// Iteration ceiling for a single run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Path of the file under repair, relative to `source_root`
    #[serde(default = "default_target_path")]
    pub target_path: String,

    /// Directory the target path is resolved against
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Window the investigator asks for when the model omits one
    #[serde(default = "default_log_window")]
    pub log_window: String,

    /// Severity the investigator asks for when the model omits one
    #[serde(default = "default_log_severity")]
    pub log_severity: String,
}

const fn default_max_iterations() -> u32 {
    3
}

fn default_target_path() -> String {
    "app.py".to_string()
}

fn default_source_root() -> String {
    ".".to_string()
}

fn default_log_window() -> String {
    "1h".to_string()
}

fn default_log_severity() -> String {
    "error".to_string()
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            target_path: default_target_path(),
            source_root: default_source_root(),
            log_window: default_log_window(),
            log_severity: default_log_severity(),
        }
    }
}

/// Application log source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LogSourceConfig {
    /// Path to the application log file
    #[serde(default = "default_log_file")]
    pub path: String,
}

fn default_log_file() -> String {
    "app_logs.txt".to_string()
}

impl Default for LogSourceConfig {
    fn default() -> Self {
        Self {
            path: default_log_file(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_initial_backoff_ms() -> u64 {
    2000
}

const fn default_max_backoff_ms() -> u64 {
    10_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Number of days to retain logs
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

const fn default_retention_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            retention_days: default_retention_days(),
        }
    }
}

/// Checkpoint persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckpointConfig {
    /// Persist snapshots to disk; in-memory only when false
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding one `<session>.jsonl` per run
    #[serde(default = "default_checkpoint_dir")]
    pub dir: String,
}

const fn default_true() -> bool {
    true
}

fn default_checkpoint_dir() -> String {
    ".selfheal/runs".to_string()
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_checkpoint_dir(),
        }
    }
}

/// Simulated publication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicationConfig {
    /// Directory simulated fixes are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_output_dir() -> String {
    ".".to_string()
}

impl Default for PublicationConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}
