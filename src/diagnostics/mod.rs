//! Static checks over generated JavaScript
//!
//! Two cheap checks run before the guardrail model sees an artifact:
//! - [`SyntaxChecker`] reports the first parse error in a snippet
//! - [`LintChecker`] runs textual heuristics and reports every finding
//!
//! Findings are informational. They are forwarded to the repair stage and
//! never stop a pipeline run on their own.

mod early;
mod lint;
mod syntax;

pub use lint::{LintChecker, LintRule};
pub use syntax::SyntaxChecker;

use crate::artifact::ArtifactField;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rule", rename_all = "snake_case")]
pub enum DiagnosticKind {
    Syntax,
    Lint(LintRule),
}

/// One human-readable problem found in a snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    /// Artifact field the snippet came from, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<ArtifactField>,
    pub message: String,
}

impl Diagnostic {
    pub fn syntax(message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Syntax,
            field: None,
            message: message.into(),
        }
    }

    pub fn lint(rule: LintRule, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Lint(rule),
            field: None,
            message: message.into(),
        }
    }

    /// Tag the diagnostic with the artifact field it was found in
    pub fn in_field(mut self, field: ArtifactField) -> Self {
        self.field = Some(field);
        self
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self.kind, DiagnosticKind::Syntax)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "[{}] {}", field, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Merged findings for a whole artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDiagnostics {
    /// First syntax error across both fields, code before interval
    pub syntax: Option<Diagnostic>,
    /// All lint findings, code findings before interval findings
    pub lint: Vec<Diagnostic>,
}

impl ArtifactDiagnostics {
    /// Keep the first syntax error seen; later ones are dropped
    pub fn record_syntax(&mut self, diagnostic: Option<Diagnostic>) {
        if self.syntax.is_none() {
            self.syntax = diagnostic;
        }
    }

    pub fn extend_lint(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.lint.extend(diagnostics);
    }

    pub fn is_clean(&self) -> bool {
        self.syntax.is_none() && self.lint.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        usize::from(self.syntax.is_some()) + self.lint.len()
    }
}

/// Syntax-check every field, then lint every field, in the given order.
///
/// Each field is checked independently; diagnostics are tagged with the
/// field they came from before merging.
pub fn diagnose(fields: &[(ArtifactField, &str)]) -> ArtifactDiagnostics {
    let syntax = SyntaxChecker::new();
    let lint = LintChecker::new();
    let mut merged = ArtifactDiagnostics::default();

    for (field, source) in fields {
        tracing::debug!(field = %field, "Checking syntax");
        merged.record_syntax(syntax.check(source).map(|d| d.in_field(*field)));
    }
    for (field, source) in fields {
        tracing::debug!(field = %field, "Running lint");
        merged.extend_lint(lint.check(source).into_iter().map(|d| d.in_field(*field)));
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::GeneratedArtifact;

    #[test]
    fn test_diagnose_merges_code_before_interval() {
        let artifact = GeneratedArtifact::new(
            "const a = 1;\na = 2;\nfunction broken( {",
            "const b = 1;\nb = 2;\n}",
        );
        let merged = diagnose(&artifact.fields());

        let syntax = merged.syntax.expect("syntax error expected");
        assert_eq!(syntax.field, Some(ArtifactField::Code));

        let fields: Vec<_> = merged.lint.iter().map(|d| d.field).collect();
        assert_eq!(
            fields,
            vec![Some(ArtifactField::Code), Some(ArtifactField::Interval)]
        );
        assert!(merged.lint[0].message.contains("`a`"));
        assert!(merged.lint[1].message.contains("`b`"));
    }

    #[test]
    fn test_diagnose_clean_artifact() {
        let artifact = GeneratedArtifact::new(
            "const amount = \"1.0\";\nconsole.log(amount);",
            "setInterval(baselineFunction, 60000);",
        );
        assert!(diagnose(&artifact.fields()).is_clean());
    }

    #[test]
    fn test_display_includes_field() {
        let diagnostic = Diagnostic::syntax("Line 1:5: Unexpected token ')'")
            .in_field(ArtifactField::Interval);
        assert_eq!(
            diagnostic.to_string(),
            "[interval] Line 1:5: Unexpected token ')'"
        );
    }

    #[test]
    fn test_first_syntax_error_wins() {
        let mut merged = ArtifactDiagnostics::default();
        merged.record_syntax(None);
        merged.record_syntax(Some(Diagnostic::syntax("first")));
        merged.record_syntax(Some(Diagnostic::syntax("second")));

        assert_eq!(merged.syntax.unwrap().message, "first");
    }

    #[test]
    fn test_issue_count() {
        let mut merged = ArtifactDiagnostics::default();
        assert!(merged.is_clean());

        merged.record_syntax(Some(Diagnostic::syntax("bad")));
        merged.extend_lint(vec![
            Diagnostic::lint(LintRule::ConstReassignment, "a"),
            Diagnostic::lint(LintRule::MissingAwait, "b"),
        ]);

        assert!(!merged.is_clean());
        assert_eq!(merged.issue_count(), 3);
    }

    #[test]
    fn test_serializes_kind_and_rule() {
        let diagnostic = Diagnostic::lint(LintRule::MissingAwait, "Missing `await`")
            .in_field(ArtifactField::Code);
        let value = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(value["kind"], "lint");
        assert_eq!(value["rule"], "missing_await");
        assert_eq!(value["field"], "code");
    }
}
