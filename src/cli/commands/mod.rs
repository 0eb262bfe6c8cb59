//! CLI command implementations.

pub mod config;
pub mod history;
pub mod logs;
pub mod run;
pub mod validate;
