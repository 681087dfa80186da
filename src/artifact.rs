//! Generated artifact model
//!
//! A `GeneratedArtifact` is the `{code, interval}` pair a model produces for
//! one trading strategy. Both the generation and the guardrail responses are
//! parsed through [`GeneratedArtifact::parse_response`], so fence handling and
//! validation are identical at both stages.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use ts_rs::TS;

/// The `{code, interval}` pair produced for one strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct GeneratedArtifact {
    /// Body of the reentrant `baselineFunction()` executing one strategy step
    pub code: String,
    /// Scheduling code that decides when `baselineFunction()` runs
    pub interval: String,
}

/// Which half of an artifact a finding refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactField {
    Code,
    Interval,
}

impl ArtifactField {
    pub fn name(&self) -> &'static str {
        match self {
            ArtifactField::Code => "code",
            ArtifactField::Interval => "interval",
        }
    }
}

impl fmt::Display for ArtifactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error type for artifact parsing failures
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("response is not a valid {{code, interval}} JSON record: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("field `{0}` is empty")]
    EmptyField(ArtifactField),
}

impl GeneratedArtifact {
    pub fn new(code: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            interval: interval.into(),
        }
    }

    /// Parse a raw model response into an artifact.
    ///
    /// Surrounding markdown fences are removed first. Keys other than `code`
    /// and `interval` are ignored; both fields must be non-blank strings.
    pub fn parse_response(raw: &str) -> Result<Self, ArtifactError> {
        let body = strip_code_fences(raw);
        let artifact: GeneratedArtifact = serde_json::from_str(body)?;

        if artifact.code.trim().is_empty() {
            return Err(ArtifactError::EmptyField(ArtifactField::Code));
        }
        if artifact.interval.trim().is_empty() {
            return Err(ArtifactError::EmptyField(ArtifactField::Interval));
        }

        Ok(artifact)
    }

    /// Both fields in checking order (code first)
    pub fn fields(&self) -> [(ArtifactField, &str); 2] {
        [
            (ArtifactField::Code, self.code.as_str()),
            (ArtifactField::Interval, self.interval.as_str()),
        ]
    }
}

/// Remove a surrounding markdown code fence, if present.
///
/// Handles an optional info string on the opening fence (```` ```json ````)
/// and a missing closing fence. Text without a leading fence is returned
/// trimmed and otherwise untouched.
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(without_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let after_header = match without_open.find('\n') {
        Some(newline_idx) => &without_open[newline_idx + 1..],
        // Single-line fence: skip the info string, if any
        None => without_open.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };

    let body = match after_header.rfind("```") {
        Some(end_idx) => &after_header[..end_idx],
        None => after_header,
    };

    body.trim()
}
