//! Logging infrastructure
//!
//! Structured logging with tracing and tracing-subscriber. Human or JSON
//! output goes to stderr; an optional daily-rolling JSON file sits alongside.

mod config;
mod logger;

pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::{parse_log_level, LoggerImpl};
