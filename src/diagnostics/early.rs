//! Early errors a script parser must raise but tree-sitter's grammar accepts
//!
//! Only runs on trees without ERROR or MISSING nodes. Covers const
//! initializers, `let` as a lexical name, duplicate lexical bindings in one
//! block, and `return`/`break`/`continue`/`yield` outside their construct.

use std::collections::HashSet;
use tree_sitter::Node;

/// Enclosing constructs of the node being visited
#[derive(Debug, Clone, Default)]
struct Enclosing {
    function: bool,
    generator: bool,
    iteration: bool,
    switch: bool,
    labels: Vec<String>,
}

impl Enclosing {
    /// Context for the children of `node`
    fn enter(&self, node: Node<'_>, source: &str) -> Self {
        match node.kind() {
            "function_declaration" | "function_expression" | "function" | "arrow_function" => {
                Self {
                    function: true,
                    ..Self::default()
                }
            }
            "generator_function_declaration" | "generator_function" => Self {
                function: true,
                generator: true,
                ..Self::default()
            },
            "method_definition" => Self {
                function: true,
                generator: has_token(node, "*"),
                ..Self::default()
            },
            "for_statement" | "for_in_statement" | "while_statement" | "do_statement" => Self {
                iteration: true,
                ..self.clone()
            },
            "switch_statement" => Self {
                switch: true,
                ..self.clone()
            },
            "labeled_statement" => {
                let mut next = self.clone();
                if let Some(label) = node
                    .child_by_field_name("label")
                    .and_then(|label| text(label, source))
                {
                    next.labels.push(label.to_string());
                }
                next
            }
            _ => self.clone(),
        }
    }
}

/// First early error in document order, formatted as `Line r:c: ...`
pub(crate) fn first_early_error(root: Node<'_>, source: &str) -> Option<String> {
    let mut found: Vec<(usize, String)> = Vec::new();
    let mut stack = vec![(root, Enclosing::default())];

    while let Some((node, enclosing)) = stack.pop() {
        match node.kind() {
            "program" | "statement_block" => duplicate_bindings(node, source, &mut found),
            "lexical_declaration" => lexical_declaration(node, source, &mut found),
            "return_statement" if !enclosing.function => {
                report(&mut found, node, "Illegal return statement".to_string())
            }
            "break_statement" => match statement_label(node, source) {
                Some(label) if !enclosing.labels.iter().any(|l| l == label) => {
                    report(&mut found, node, format!("Undefined label '{}'", label))
                }
                None if !enclosing.iteration && !enclosing.switch => {
                    report(&mut found, node, "Illegal break statement".to_string())
                }
                _ => {}
            },
            "continue_statement" => match statement_label(node, source) {
                Some(label) if !enclosing.labels.iter().any(|l| l == label) => {
                    report(&mut found, node, format!("Undefined label '{}'", label))
                }
                _ if !enclosing.iteration => report(
                    &mut found,
                    node,
                    "Illegal continue statement: no surrounding iteration statement".to_string(),
                ),
                _ => {}
            },
            "yield_expression" if !enclosing.generator => {
                report(&mut found, node, "Unexpected token 'yield'".to_string())
            }
            _ => {}
        }

        let inner = enclosing.enter(node, source);
        for i in (0..node.named_child_count()).rev() {
            if let Some(child) = node.named_child(i) {
                stack.push((child, inner.clone()));
            }
        }
    }

    found
        .into_iter()
        .min_by_key(|(byte, _)| *byte)
        .map(|(_, message)| message)
}

fn report(found: &mut Vec<(usize, String)>, node: Node<'_>, description: String) {
    let position = node.start_position();
    found.push((
        node.start_byte(),
        format!(
            "Line {}:{}: {}",
            position.row + 1,
            position.column + 1,
            description
        ),
    ));
}

fn lexical_declaration(node: Node<'_>, source: &str, found: &mut Vec<(usize, String)>) {
    let is_const = node.child(0).is_some_and(|keyword| keyword.kind() == "const");

    for declarator in declarators(node) {
        if let Some(name) = declarator.child_by_field_name("name") {
            if text(name, source) == Some("let") {
                report(
                    found,
                    name,
                    "let is disallowed as a lexically bound name".to_string(),
                );
            }
        }
        if is_const && declarator.child_by_field_name("value").is_none() {
            report(
                found,
                declarator,
                "Missing initializer in const declaration".to_string(),
            );
        }
    }
}

/// `let`, `const` and `class` names declared twice directly in one block
fn duplicate_bindings(block: Node<'_>, source: &str, found: &mut Vec<(usize, String)>) {
    let mut seen: HashSet<&str> = HashSet::new();

    for i in 0..block.named_child_count() {
        let Some(statement) = block.named_child(i) else {
            continue;
        };
        let names: Vec<Node<'_>> = match statement.kind() {
            "lexical_declaration" => declarators(statement)
                .into_iter()
                .filter_map(|d| d.child_by_field_name("name"))
                .filter(|name| name.kind() == "identifier")
                .collect(),
            "class_declaration" => statement.child_by_field_name("name").into_iter().collect(),
            _ => continue,
        };

        for name in names {
            let Some(identifier) = text(name, source) else {
                continue;
            };
            if !seen.insert(identifier) {
                report(
                    found,
                    name,
                    format!("Identifier '{}' has already been declared", identifier),
                );
            }
        }
    }
}

fn declarators(declaration: Node<'_>) -> Vec<Node<'_>> {
    (0..declaration.named_child_count())
        .filter_map(|i| declaration.named_child(i))
        .filter(|child| child.kind() == "variable_declarator")
        .collect()
}

fn statement_label<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    node.child_by_field_name("label")
        .and_then(|label| text(label, source))
}

fn has_token(node: Node<'_>, kind: &str) -> bool {
    (0..node.child_count())
        .filter_map(|i| node.child(i))
        .any(|child| child.kind() == kind)
}

fn text<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    node.utf8_text(source.as_bytes()).ok()
}
