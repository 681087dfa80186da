//! Shallow lint heuristics for generated strategy code
//!
//! These are textual checks, not scope-aware analysis. They exist to catch
//! obviously broken output cheaply before the guardrail call; false
//! positives (shadowed names, matches inside strings) are tolerated.

use super::Diagnostic;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Identifier characters in JavaScript, ASCII subset
const IDENT: &str = r"[A-Za-z_$][0-9A-Za-z_$]*";

/// The individual heuristics, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LintRule {
    /// `const x` followed later by `x = ...`
    ConstReassignment,
    /// Call to a locally declared async function without `await`
    MissingAwait,
    /// A price-like variable compared both `>` and `<` against literals
    ContradictoryComparison,
}

impl LintRule {
    pub fn name(&self) -> &'static str {
        match self {
            LintRule::ConstReassignment => "const_reassignment",
            LintRule::MissingAwait => "missing_await",
            LintRule::ContradictoryComparison => "contradictory_comparison",
        }
    }
}

struct Patterns {
    const_decl: Regex,
    async_fn_decl: Regex,
    async_binding_decl: Regex,
    comparison_var_first: Regex,
    comparison_literal_first: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        const_decl: Regex::new(&format!(r"\bconst\s+({IDENT})"))
            .expect("const declaration pattern is valid"),
        async_fn_decl: Regex::new(&format!(r"\basync\s+function\s*\*?\s*({IDENT})"))
            .expect("async function pattern is valid"),
        async_binding_decl: Regex::new(&format!(r"\b(?:const|let|var)\s+({IDENT})\s*=\s*async\b"))
            .expect("async binding pattern is valid"),
        comparison_var_first: Regex::new(&format!(
            r"(?:^|[^0-9A-Za-z_$])({IDENT})\)*\s*([<>])=?\s*\(*\s*-?\d"
        ))
        .expect("comparison pattern is valid"),
        comparison_literal_first: Regex::new(&format!(
            r"(?:^|[^0-9A-Za-z_$.])-?\d+(?:\.\d+)?\s*([<>])=?\s*\(*\s*({IDENT})"
        ))
        .expect("comparison pattern is valid"),
    })
}

/// Runs every lint heuristic over a snippet
#[derive(Debug, Default, Clone, Copy)]
pub struct LintChecker;

impl LintChecker {
    pub fn new() -> Self {
        Self
    }

    /// Run all heuristics and return every finding.
    ///
    /// Order is fixed: reassignment findings, then missing-await findings,
    /// then contradictory comparisons. An empty list means nothing was
    /// flagged. The check is pure, so repeated calls agree.
    pub fn check(&self, source: &str) -> Vec<Diagnostic> {
        tracing::debug!(len = source.len(), "Running lint check");

        let mut findings = const_reassignments(source);
        findings.extend(missing_awaits(source));
        findings.extend(contradictory_comparisons(source));

        if findings.is_empty() {
            tracing::debug!("Lint looks good (shallow checks)");
        } else {
            tracing::warn!(count = findings.len(), "Lint issues found");
        }

        findings
    }
}

fn const_reassignments(source: &str) -> Vec<Diagnostic> {
    let mut findings = Vec::new();

    for caps in patterns().const_decl.captures_iter(source) {
        let (Some(decl), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let rest = &source[decl.end()..];

        // Plain or compound assignment, but not `==`, `===` or `=>`
        let pattern = format!(
            r"(?:^|[^0-9A-Za-z_$.]){}\s*(?:\*\*|<<|>>>|>>|&&|\|\||\?\?|[-+*/%&|^])?=(?:[^=>]|$)",
            regex::escape(name.as_str())
        );
        if let Ok(assignment) = Regex::new(&pattern) {
            if assignment.is_match(rest) {
                findings.push(Diagnostic::lint(
                    LintRule::ConstReassignment,
                    format!("Cannot reassign const `{}`", name.as_str()),
                ));
            }
        }
    }

    findings
}

fn declared_async_functions(source: &str) -> Vec<String> {
    let p = patterns();
    let mut names: Vec<(usize, String)> = p
        .async_fn_decl
        .captures_iter(source)
        .chain(p.async_binding_decl.captures_iter(source))
        .filter_map(|caps| caps.get(1))
        .map(|m| (m.start(), m.as_str().to_string()))
        .collect();

    // Source order, one entry per name
    names.sort_by_key(|(pos, _)| *pos);
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for (_, name) in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

fn missing_awaits(source: &str) -> Vec<Diagnostic> {
    let mut findings = Vec::new();

    for name in declared_async_functions(source) {
        let pattern = format!(
            r"(?:^|[^0-9A-Za-z_$.])({})\s*\(",
            regex::escape(&name)
        );
        let Ok(call) = Regex::new(&pattern) else {
            continue;
        };

        let unawaited = call
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .map(|m| source[..m.start()].trim_end())
            .filter(|prefix| !is_declaration(prefix))
            .any(|prefix| !ends_with_keyword(prefix, "await"));

        if unawaited {
            findings.push(Diagnostic::lint(
                LintRule::MissingAwait,
                format!("Missing `await` for `{}()` call", name),
            ));
        }
    }

    findings
}

fn is_declaration(prefix: &str) -> bool {
    let prefix = prefix.strip_suffix('*').map(str::trim_end).unwrap_or(prefix);
    ends_with_keyword(prefix, "function")
}

fn ends_with_keyword(prefix: &str, keyword: &str) -> bool {
    match prefix.strip_suffix(keyword) {
        Some(before) => !before
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
        None => false,
    }
}

fn is_price_like(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with("price")
}

fn contradictory_comparisons(source: &str) -> Vec<Diagnostic> {
    // (name, compared greater-than, compared less-than), first-seen order
    let mut seen: Vec<(String, bool, bool)> = Vec::new();
    let mut note = |name: &str, greater: bool| {
        if !is_price_like(name) {
            return;
        }
        let entry = match seen.iter().position(|(n, _, _)| n == name) {
            Some(idx) => &mut seen[idx],
            None => {
                seen.push((name.to_string(), false, false));
                let last = seen.len() - 1;
                &mut seen[last]
            }
        };
        if greater {
            entry.1 = true;
        } else {
            entry.2 = true;
        }
    };

    let p = patterns();
    for caps in p.comparison_var_first.captures_iter(source) {
        if let (Some(name), Some(op)) = (caps.get(1), caps.get(2)) {
            note(name.as_str(), op.as_str() == ">");
        }
    }
    // `10 < price` compares price greater-than 10
    for caps in p.comparison_literal_first.captures_iter(source) {
        if let (Some(op), Some(name)) = (caps.get(1), caps.get(2)) {
            note(name.as_str(), op.as_str() == "<");
        }
    }

    seen.into_iter()
        .filter(|(_, greater, less)| *greater && *less)
        .map(|(name, _, _)| {
            Diagnostic::lint(
                LintRule::ContradictoryComparison,
                format!(
                    "Suspicious: both `{} > x` and `{} < y` found",
                    name, name
                ),
            )
        })
        .collect()
}
