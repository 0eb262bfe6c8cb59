pub mod file_log_source;

pub use file_log_source::{line_limit, FileLogSource};
