//! Stage and category color mapping for CLI output.
//!
//! All coloring respects `NO_COLOR` env var automatically via the `colored` crate.

use colored::{ColoredString, Colorize};

/// Color scheme:
/// - Green:  published
/// - Yellow: investigating, fixing, validating
/// - Blue:   publishing
/// - Red:    publish_failed, aborted
pub fn colorize_stage(stage: &str) -> ColoredString {
    match stage {
        "published" => stage.green().bold(),
        "investigating" | "fixing" | "validating" => stage.yellow(),
        "publishing" => stage.blue(),
        s if s == "publish_failed" || s.starts_with("aborted") => stage.red().bold(),
        _ => stage.white(),
    }
}

/// Syntax red, interface magenta, lint yellow, empty dimmed.
pub fn colorize_category(category: &str) -> ColoredString {
    match category {
        "syntax" => category.red(),
        "interface" => category.magenta(),
        "lint" => category.yellow(),
        "empty" => category.dimmed(),
        _ => category.white(),
    }
}

pub fn yes_no(value: bool) -> ColoredString {
    if value {
        "yes".green()
    } else {
        "no".red()
    }
}

/// Styled label for detail views (bold + dimmed colon).
pub fn label(name: &str) -> String {
    format!("{}{}", name.bold(), ":".dimmed())
}
