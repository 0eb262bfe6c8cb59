//! Infrastructure layer module
//!
//! Concrete integrations the domain ports are wired to at startup:
//! - Configuration loading (figment)
//! - Logging (tracing)
//! - Language model providers (Groq, Gemini)
//! - Retry with exponential backoff

pub mod config;
pub mod llm;
pub mod logging;
pub mod retry;

pub use config::{ConfigError, ConfigLoader};
pub use retry::RetryPolicy;
