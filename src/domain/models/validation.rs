//! Validation report types produced by the fix validator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a single validation violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCategory {
    /// Candidate does not parse.
    Syntax,
    /// Candidate dropped routines the original defines.
    Interface,
    /// Candidate contains an untyped catch-all handler.
    Lint,
    /// No candidate was produced at all.
    Empty,
}

impl ViolationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Interface => "interface",
            Self::Lint => "lint",
            Self::Empty => "empty",
        }
    }
}

impl fmt::Display for ViolationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single, specific reason a candidate fix failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub category: ViolationCategory,
    pub message: String,
}

impl Violation {
    pub fn new(category: ViolationCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Outcome of validating one candidate fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Build a report from collected violations; passes only when there are none.
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }

    pub fn passed() -> Self {
        Self::from_violations(Vec::new())
    }

    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        if self.passed {
            "All checks passed! The fix is valid.".to_string()
        } else {
            format!("Validation failed: {} issue(s) found", self.violations.len())
        }
    }

    /// Violation messages in order, for prompt feedback and state storage.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_passes_only_without_violations() {
        assert!(ValidationReport::passed().passed);

        let report = ValidationReport::from_violations(vec![Violation::new(
            ViolationCategory::Lint,
            "bare except",
        )]);
        assert!(!report.passed);
        assert_eq!(report.summary(), "Validation failed: 1 issue(s) found");
        assert_eq!(report.messages(), vec!["bare except".to_string()]);
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&ViolationCategory::Interface).unwrap();
        assert_eq!(json, "\"interface\"");
    }
}
