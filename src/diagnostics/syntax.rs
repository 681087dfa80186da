//! Tree-sitter based syntax check for JavaScript snippets

use super::early::first_early_error;
use super::Diagnostic;
use std::cell::RefCell;
use tree_sitter::{Node, Parser, Tree};

/// Longest token excerpt quoted in a diagnostic
const MAX_TOKEN_EXCERPT: usize = 40;

thread_local! {
    // Parsers are not Sync; each worker thread keeps its own.
    static JS_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        // A failed set_language surfaces as a None tree at parse time
        let _ = p.set_language(&tree_sitter_javascript::LANGUAGE.into());
        p
    });
}

/// Reports the first parse or early error in a script
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntaxChecker;

impl SyntaxChecker {
    pub fn new() -> Self {
        Self
    }

    /// Parse `source` as a complete script.
    ///
    /// Returns `None` when the script parses cleanly, otherwise a single
    /// one-line diagnostic describing the first error in document order.
    pub fn check(&self, source: &str) -> Option<Diagnostic> {
        tracing::debug!(len = source.len(), "Running syntax check");

        let Some(tree) = parse(source) else {
            tracing::warn!("JavaScript parser produced no tree");
            return Some(Diagnostic::syntax(
                "Line 1:1: Parser rejected the input".to_string(),
            ));
        };

        let root = tree.root_node();
        let message = if root.has_error() {
            match first_error_node(root) {
                Some(node) => describe(node, source),
                None => "Line 1:1: Invalid syntax".to_string(),
            }
        } else {
            match first_early_error(root, source) {
                Some(message) => message,
                None => {
                    tracing::debug!("Syntax looks good");
                    return None;
                }
            }
        };
        tracing::warn!(error = %message, "Syntax error");

        Some(Diagnostic::syntax(first_line(&message).to_string()))
    }
}

fn parse(source: &str) -> Option<Tree> {
    JS_PARSER.with(|p| p.borrow_mut().parse(source, None))
}

/// Pre-order walk that only descends into subtrees containing errors
fn first_error_node(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn describe(node: Node<'_>, source: &str) -> String {
    let position = node.start_position();
    let location = format!("Line {}:{}", position.row + 1, position.column + 1);

    if node.is_missing() {
        return format!("{}: Missing '{}'", location, node.kind());
    }

    // Quote the first offending token rather than the whole error span
    let token = first_leaf(node)
        .and_then(|leaf| leaf.utf8_text(source.as_bytes()).ok())
        .map(str::trim)
        .filter(|text| !text.is_empty());

    match token {
        Some(text) => format!(
            "{}: Unexpected token '{}'",
            location,
            excerpt(first_line(text))
        ),
        None => format!("{}: Unexpected end of input", location),
    }
}

fn first_leaf(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    while let Some(child) = current.child(0) {
        current = child;
    }
    if current.end_byte() > current.start_byte() {
        Some(current)
    } else if node.end_byte() > node.start_byte() {
        Some(node)
    } else {
        None
    }
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(MAX_TOKEN_EXCERPT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text)
}
