//! Guardrail call: review, fix and re-validate a generated artifact

use super::prompts::{repair_user_prompt, REPAIR_SYSTEM_PROMPT};
use crate::artifact::{ArtifactError, GeneratedArtifact};
use crate::diagnostics::Diagnostic;
use crate::llm::TextGenerator;
use std::sync::Arc;
use thiserror::Error;

/// Error type for the repair stage
#[derive(Debug, Error)]
pub enum RepairError {
    #[error("Guardrail request failed: {0}")]
    Transport(#[source] crate::Error),

    #[error("Malformed guardrail output: {source}")]
    Malformed {
        #[source]
        source: ArtifactError,
        raw: String,
    },
}

/// Stateless client for the guardrail call
#[derive(Clone)]
pub struct RepairClient {
    generator: Arc<dyn TextGenerator>,
}

impl RepairClient {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Ask the guardrail model for the final artifact.
    ///
    /// The response replaces `artifact` wholesale. There is no second
    /// attempt and no fallback to the input on a malformed response.
    pub async fn repair(
        &self,
        artifact: &GeneratedArtifact,
        syntax: Option<&Diagnostic>,
        lint: &[Diagnostic],
    ) -> Result<GeneratedArtifact, RepairError> {
        tracing::info!(
            model = %self.generator.model(),
            has_syntax_error = syntax.is_some(),
            lint_count = lint.len(),
            "Invoking guardrail model"
        );

        let user = repair_user_prompt(artifact, syntax, lint);
        let raw = self
            .generator
            .invoke(REPAIR_SYSTEM_PROMPT, &user)
            .await
            .map_err(RepairError::Transport)?;

        GeneratedArtifact::parse_response(&raw).map_err(|source| RepairError::Malformed {
            source,
            raw,
        })
    }
}
