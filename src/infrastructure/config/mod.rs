//! Layered configuration loading (defaults, YAML files, environment).

mod loader;

pub use loader::{ConfigError, ConfigLoader};
