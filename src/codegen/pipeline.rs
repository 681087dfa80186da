//! Generate, check, repair
//!
//! ```text
//! START -> GENERATE -> PARSE -> SYNTAX_CHECK(code) -> SYNTAX_CHECK(interval)
//!       -> LINT_CHECK(code) -> LINT_CHECK(interval) -> REPAIR -> DONE
//! ```
//!
//! Each run is strictly sequential. The repair stage always runs and its
//! output is the result; diagnostics only inform it.

use super::context::PipelineContext;
use super::generation::GenerationClient;
use super::repair::{RepairClient, RepairError};
use crate::artifact::{ArtifactError, ArtifactField, GeneratedArtifact};
use crate::audit::{AuditLog, StageRecord, StageStatus};
use crate::config::{Config, LlmEndpoint};
use crate::diagnostics::{ArtifactDiagnostics, Diagnostic, LintChecker, SyntaxChecker};
use crate::llm::{OpenAiChatClient, ResponseSchema, TextGenerator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

/// Position in the run state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Generate,
    Parse,
    SyntaxCheck(ArtifactField),
    LintCheck(ArtifactField),
    Repair,
    Done,
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Start => "START",
            PipelineState::Generate => "GENERATE",
            PipelineState::Parse => "PARSE",
            PipelineState::SyntaxCheck(_) => "SYNTAX_CHECK",
            PipelineState::LintCheck(_) => "LINT_CHECK",
            PipelineState::Repair => "REPAIR",
            PipelineState::Done => "DONE",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::SyntaxCheck(field) | PipelineState::LintCheck(field) => {
                write!(f, "{}({})", self.name(), field)
            }
            _ => f.write_str(self.name()),
        }
    }
}

/// Terminal failure states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureState {
    GenerateFailed,
    ParseFailed,
    RepairFailed,
}

impl FailureState {
    pub fn name(&self) -> &'static str {
        match self {
            FailureState::GenerateFailed => "GENERATE_FAILED",
            FailureState::ParseFailed => "PARSE_FAILED",
            FailureState::RepairFailed => "REPAIR_FAILED",
        }
    }
}

impl fmt::Display for FailureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A run that ended without an artifact
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{state}: {error}")]
pub struct PipelineFailure {
    pub state: FailureState,
    /// Short human-readable reason
    pub error: String,
    /// Offending model output, or the transport error detail
    pub raw_or_detail: String,
}

impl PipelineFailure {
    fn generate(err: crate::Error) -> Self {
        Self {
            state: FailureState::GenerateFailed,
            error: "Code generation request failed".to_string(),
            raw_or_detail: err.to_string(),
        }
    }

    fn parse(raw: String, err: &ArtifactError) -> Self {
        Self {
            state: FailureState::ParseFailed,
            error: malformed_reason("Generated", err),
            raw_or_detail: raw,
        }
    }

    fn repair(err: RepairError) -> Self {
        match err {
            RepairError::Transport(e) => Self {
                state: FailureState::RepairFailed,
                error: "Guardrail request failed".to_string(),
                raw_or_detail: e.to_string(),
            },
            RepairError::Malformed { source, raw } => Self {
                state: FailureState::RepairFailed,
                error: malformed_reason("Guardrail", &source),
                raw_or_detail: raw,
            },
        }
    }
}

fn malformed_reason(stage: &str, err: &ArtifactError) -> String {
    match err {
        ArtifactError::InvalidJson(_) => format!("{} output not valid JSON", stage),
        ArtifactError::EmptyField(field) => {
            format!("{} output has an empty `{}` field", stage, field)
        }
    }
}

/// Orchestrates generation, static checks and the guardrail repair
#[derive(Clone)]
pub struct CodeGenerationPipeline {
    generation: GenerationClient,
    repair: RepairClient,
    audit: Option<AuditLog>,
}

impl CodeGenerationPipeline {
    pub fn new(generation: GenerationClient, repair: RepairClient) -> Self {
        Self {
            generation,
            repair,
            audit: None,
        }
    }

    pub fn with_audit_log(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Wire both stages to the chat-completions service
    pub fn from_config(config: &Config, endpoint: LlmEndpoint) -> crate::Result<Self> {
        let timeout = config.request_timeout();
        let mut generator =
            OpenAiChatClient::new(endpoint.clone(), config.generation.clone(), timeout)?;
        let mut guardrail = OpenAiChatClient::new(endpoint, config.repair.clone(), timeout)?;

        if config.structured_output {
            let schema = ResponseSchema::for_type::<GeneratedArtifact>("generated_artifact")?;
            generator = generator.with_response_schema(schema.clone());
            guardrail = guardrail.with_response_schema(schema);
        }

        let generator: Arc<dyn TextGenerator> = Arc::new(generator);
        let guardrail: Arc<dyn TextGenerator> = Arc::new(guardrail);
        let mut pipeline = Self::new(
            GenerationClient::new(generator),
            RepairClient::new(guardrail),
        );

        if let Some(path) = &config.audit_log_path {
            tracing::info!(path = %path, "Audit logging enabled");
            pipeline = pipeline.with_audit_log(AuditLog::new(path));
        }

        Ok(pipeline)
    }

    /// Run one prompt through the whole pipeline
    pub async fn run(&self, context: &PipelineContext) -> Result<GeneratedArtifact, PipelineFailure> {
        let run_id = Uuid::new_v4();
        let run = RunTracker {
            run_id,
            audit: self.audit.as_ref(),
        };
        tracing::info!(run_id = %run_id, state = %PipelineState::Start, "Pipeline run started");

        // GENERATE
        let started = Instant::now();
        let raw = match self.generation.generate(context).await {
            Ok(raw) => {
                run.stage(PipelineState::Generate, Some(self.generation.model()), started, None)
                    .await;
                raw
            }
            Err(e) => {
                let failure = PipelineFailure::generate(e);
                run.fail(PipelineState::Generate, Some(self.generation.model()), started, &failure)
                    .await;
                return Err(failure);
            }
        };

        // PARSE
        let started = Instant::now();
        let artifact = match GeneratedArtifact::parse_response(&raw) {
            Ok(artifact) => {
                run.stage(PipelineState::Parse, None, started, None).await;
                artifact
            }
            Err(e) => {
                tracing::debug!(run_id = %run_id, error = %e, "Generated output rejected");
                let failure = PipelineFailure::parse(raw, &e);
                run.fail(PipelineState::Parse, None, started, &failure).await;
                return Err(failure);
            }
        };

        // SYNTAX_CHECK for every field, then LINT_CHECK, code before interval
        let mut diagnostics = ArtifactDiagnostics::default();
        let syntax = SyntaxChecker::new();
        for (field, source) in artifact.fields() {
            let started = Instant::now();
            let found = syntax.check(source).map(|d| d.in_field(field));
            let detail = match &found {
                Some(diagnostic) => {
                    tracing::warn!(run_id = %run_id, diagnostic = %diagnostic, "Diagnostic");
                    diagnostic.message.clone()
                }
                None => "clean".to_string(),
            };
            run.stage(PipelineState::SyntaxCheck(field), None, started, Some(detail))
                .await;
            diagnostics.record_syntax(found);
        }

        let lint = LintChecker::new();
        for (field, source) in artifact.fields() {
            let started = Instant::now();
            let found: Vec<Diagnostic> = lint
                .check(source)
                .into_iter()
                .map(|d| d.in_field(field))
                .collect();
            for diagnostic in &found {
                tracing::warn!(run_id = %run_id, diagnostic = %diagnostic, "Diagnostic");
            }
            let detail = format!("{} issue(s)", found.len());
            run.stage(PipelineState::LintCheck(field), None, started, Some(detail))
                .await;
            diagnostics.extend_lint(found);
        }

        // REPAIR
        let started = Instant::now();
        let repaired = self
            .repair
            .repair(&artifact, diagnostics.syntax.as_ref(), &diagnostics.lint)
            .await;
        match repaired {
            Ok(final_artifact) => {
                run.stage(PipelineState::Repair, Some(self.repair.model()), started, None)
                    .await;
                tracing::info!(run_id = %run_id, state = %PipelineState::Done, "Guardrail complete");
                Ok(final_artifact)
            }
            Err(e) => {
                tracing::debug!(run_id = %run_id, error = %e, "Repair stage failed");
                let failure = PipelineFailure::repair(e);
                run.fail(PipelineState::Repair, Some(self.repair.model()), started, &failure)
                    .await;
                Err(failure)
            }
        }
    }
}

/// Per-run logging and audit helper
struct RunTracker<'a> {
    run_id: Uuid,
    audit: Option<&'a AuditLog>,
}

impl RunTracker<'_> {
    async fn stage(
        &self,
        state: PipelineState,
        model: Option<&str>,
        started: Instant,
        detail: Option<String>,
    ) {
        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(run_id = %self.run_id, state = %state, duration_ms, "Stage complete");

        if let Some(audit) = self.audit {
            let stage = state.to_string();
            audit
                .record(StageRecord {
                    run_id: self.run_id,
                    stage: &stage,
                    status: StageStatus::Success,
                    model,
                    detail,
                    duration_ms,
                })
                .await;
        }
    }

    async fn fail(
        &self,
        state: PipelineState,
        model: Option<&str>,
        started: Instant,
        failure: &PipelineFailure,
    ) {
        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::error!(
            run_id = %self.run_id,
            state = %state,
            terminal = %failure.state,
            error = %failure.error,
            "Pipeline run failed"
        );

        if let Some(audit) = self.audit {
            let stage = state.to_string();
            audit
                .record(StageRecord {
                    run_id: self.run_id,
                    stage: &stage,
                    status: StageStatus::Error,
                    model,
                    detail: Some(format!("{}: {}", failure.error, failure.raw_or_detail)),
                    duration_ms,
                })
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(PipelineState::Generate.to_string(), "GENERATE");
        assert_eq!(
            PipelineState::SyntaxCheck(ArtifactField::Interval).to_string(),
            "SYNTAX_CHECK(interval)"
        );
    }

    fn rejection(raw: &str) -> ArtifactError {
        GeneratedArtifact::parse_response(raw).unwrap_err()
    }

    #[test]
    fn test_parse_and_repair_failures_are_distinct() {
        let parse = PipelineFailure::parse("oops".to_string(), &rejection("oops"));
        let repair = PipelineFailure::repair(RepairError::Malformed {
            source: rejection("oops"),
            raw: "oops".to_string(),
        });

        assert_ne!(parse.state, repair.state);
        assert_ne!(parse.error, repair.error);
        assert_eq!(parse.raw_or_detail, repair.raw_or_detail);
    }

    #[test]
    fn test_failure_state_serializes_screaming_case() {
        let value = serde_json::to_value(FailureState::RepairFailed).unwrap();
        assert_eq!(value, "REPAIR_FAILED");
    }

    #[test]
    fn test_failure_display() {
        let failure = PipelineFailure::parse("x".to_string(), &rejection("x"));
        assert_eq!(
            failure.to_string(),
            "PARSE_FAILED: Generated output not valid JSON"
        );
    }

    #[test]
    fn test_blank_field_failure_names_the_field() {
        let raw = r#"{"code": "f()", "interval": "  "}"#;
        let parse = PipelineFailure::parse(raw.to_string(), &rejection(raw));
        assert_eq!(parse.state, FailureState::ParseFailed);
        assert_eq!(parse.error, "Generated output has an empty `interval` field");
        assert_eq!(parse.raw_or_detail, raw);

        let repair = PipelineFailure::repair(RepairError::Malformed {
            source: rejection(raw),
            raw: raw.to_string(),
        });
        assert_eq!(repair.error, "Guardrail output has an empty `interval` field");
    }
}
