//! Command-line interface.

pub mod commands;
pub mod display;
pub mod service;
pub mod types;

pub use types::{Cli, Commands};

/// Print `err` in the selected format and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        use colored::Colorize;
        eprintln!("{} {err:#}", "Error:".red().bold());
    }
    std::process::exit(1)
}
