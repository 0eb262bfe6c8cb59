//! Static-analysis gate for candidate Python fixes.
//!
//! Checks run in a fixed order:
//!
//! 1. **Syntax** -- the candidate must parse as Python 3. A failure yields
//!    exactly one violation and stops. The grammar also accepts Python 2
//!    forms and stray indentation, so a conformance pass rejects those.
//! 2. **Interface** -- every function name defined anywhere in a parseable
//!    original must still be defined somewhere in the candidate. A failure
//!    yields one violation naming the missing set and stops.
//! 3. **Lint** -- every bare `except:` in the candidate is reported. This
//!    check collects all occurrences.
//!
//! The validator holds no state; parsers come from a thread-local pool.

use std::cell::RefCell;
use std::collections::BTreeSet;

use tree_sitter::{Node, Parser, Tree};

use crate::domain::models::validation::{ValidationReport, Violation, ViolationCategory};

// ---------------------------------------------------------------------------
// Thread-local parser pool
// ---------------------------------------------------------------------------

thread_local! {
    static PYTHON_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        // A failure here surfaces as `parse` returning None.
        let _ = p.set_language(&tree_sitter_python::LANGUAGE.into());
        p
    });
}

fn parse_python(source: &str) -> Option<Tree> {
    PYTHON_PARSER.with(|p| p.borrow_mut().parse(source, None))
}

// ---------------------------------------------------------------------------
// FixValidator
// ---------------------------------------------------------------------------

/// Pure validator for candidate fixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixValidator;

impl FixValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate `candidate`, comparing routines against `original` when supplied.
    pub fn validate(&self, candidate: &str, original: Option<&str>) -> ValidationReport {
        let tree = match parse_python(candidate) {
            Some(tree) => tree,
            None => {
                return ValidationReport::from_violations(vec![Violation::new(
                    ViolationCategory::Syntax,
                    "Syntax error: source could not be parsed",
                )])
            }
        };
        let root = tree.root_node();

        if root.has_error() {
            return ValidationReport::from_violations(vec![syntax_violation(root, candidate)]);
        }
        if let Some(violation) = python3_violation(root) {
            return ValidationReport::from_violations(vec![violation]);
        }

        if let Some(original) = original {
            if let Some(missing) = missing_routines(original, root, candidate) {
                return ValidationReport::from_violations(vec![Violation::new(
                    ViolationCategory::Interface,
                    format!(
                        "Functions removed from original code: {{{}}}. \
                         All original functions must be preserved.",
                        missing.into_iter().collect::<Vec<_>>().join(", ")
                    ),
                )]);
            }
        }

        let mut violations = Vec::new();
        collect_bare_excepts(root, &mut violations);
        ValidationReport::from_violations(violations)
    }

    /// Routine names defined in `source`, or `None` if it does not parse.
    pub fn routines(&self, source: &str) -> Option<BTreeSet<String>> {
        let tree = parse_python(source)?;
        let root = tree.root_node();
        if root.has_error() {
            return None;
        }
        let mut names = BTreeSet::new();
        collect_routines(root, source, &mut names);
        Some(names)
    }
}

// ---------------------------------------------------------------------------
// Syntax
// ---------------------------------------------------------------------------

fn syntax_violation(root: Node<'_>, source: &str) -> Violation {
    let message = match first_fault(root) {
        Some(node) => {
            let pos = node.start_position();
            let detail = if node.is_missing() {
                format!("missing `{}`", node.kind())
            } else {
                let text = node.utf8_text(source.as_bytes()).unwrap_or_default();
                let snippet: String = text
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .chars()
                    .take(40)
                    .collect();
                if snippet.is_empty() {
                    "invalid syntax".to_string()
                } else {
                    format!("unexpected `{snippet}`")
                }
            };
            format!(
                "Syntax error at line {}, column {}: {}",
                pos.row + 1,
                pos.column + 1,
                detail
            )
        }
        None => "Syntax error at line 1, column 1: invalid syntax".to_string(),
    };
    Violation::new(ViolationCategory::Syntax, message)
}

/// First ERROR or MISSING node in document order.
fn first_fault(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_fault)
}

/// First construct the grammar accepts but Python 3 rejects.
fn python3_violation(node: Node<'_>) -> Option<Violation> {
    if let Some(detail) = python2_construct(node) {
        let pos = node.start_position();
        return Some(Violation::new(
            ViolationCategory::Syntax,
            format!(
                "Syntax error at line {}, column {}: {detail}",
                pos.row + 1,
                pos.column + 1
            ),
        ));
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(python3_violation)
}

fn python2_construct(node: Node<'_>) -> Option<&'static str> {
    match node.kind() {
        "print_statement" => Some("`print` statement; call `print(...)` instead"),
        "exec_statement" => Some("`exec` statement; call `exec(...)` instead"),
        "except_clause" if has_token(node, ",") => {
            Some("`except X, name` form; use `except X as name`")
        }
        "augmented_assignment" => node
            .child_by_field_name("left")
            .filter(|left| {
                !matches!(
                    left.kind(),
                    "identifier" | "attribute" | "subscript" | "parenthesized_expression"
                )
            })
            .map(|_| "illegal target for augmented assignment"),
        "comparison_operator" if has_token(node, "<>") => Some("`<>` operator; use `!=`"),
        "block" => node
            .parent()
            .filter(|parent| matches!(parent.kind(), "module" | "block"))
            .map(|_| "unexpected indent"),
        _ => None,
    }
}

/// Whether `node` has a direct anonymous child `token`.
fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

// ---------------------------------------------------------------------------
// Interface
// ---------------------------------------------------------------------------

/// Routines in `original` absent from the candidate.
///
/// `None` when nothing is missing or when the original does not parse.
fn missing_routines(
    original: &str,
    candidate_root: Node<'_>,
    candidate: &str,
) -> Option<BTreeSet<String>> {
    let original_tree = parse_python(original)?;
    let original_root = original_tree.root_node();
    if original_root.has_error() {
        return None;
    }

    let mut expected = BTreeSet::new();
    collect_routines(original_root, original, &mut expected);
    let mut present = BTreeSet::new();
    collect_routines(candidate_root, candidate, &mut present);

    let missing: BTreeSet<String> = expected.difference(&present).cloned().collect();
    if missing.is_empty() {
        None
    } else {
        Some(missing)
    }
}

/// Names of every function definition, nested ones and methods included.
///
/// Names are unqualified: a method `Service.stop` is recorded as `stop`.
fn collect_routines(node: Node<'_>, source: &str, out: &mut BTreeSet<String>) {
    if node.kind() == "function_definition" {
        if let Some(name) = field_text(node, "name", source) {
            out.insert(name.to_string());
        }
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();
    for child in children {
        collect_routines(child, source, out);
    }
}

fn field_text<'s>(node: Node<'_>, field: &str, source: &'s str) -> Option<&'s str> {
    node.child_by_field_name(field)
        .and_then(|n| n.utf8_text(source.as_bytes()).ok())
}

// ---------------------------------------------------------------------------
// Lint
// ---------------------------------------------------------------------------

fn collect_bare_excepts(node: Node<'_>, out: &mut Vec<Violation>) {
    if node.kind() == "except_clause" && is_bare_except(node) {
        out.push(Violation::new(
            ViolationCategory::Lint,
            format!(
                "Bare 'except:' at line {}: use specific exception types \
                 (e.g. 'except KeyError:') to avoid masking unrelated errors.",
                node.start_position().row + 1
            ),
        ));
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();
    for child in children {
        collect_bare_excepts(child, out);
    }
}

/// An except clause whose only named children are its block and comments.
fn is_bare_except(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let bare = node
        .named_children(&mut cursor)
        .all(|c| matches!(c.kind(), "block" | "comment"));
    bare
}
