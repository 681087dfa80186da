//! Request/response contract for the code generation endpoint
//!
//! The HTTP transport lives outside this crate. It deserializes a
//! [`CodeRequest`], runs the pipeline and returns the pair produced by
//! [`respond`].

use crate::artifact::GeneratedArtifact;
use crate::codegen::{PipelineContext, PipelineFailure};
use crate::config::Config;
use crate::history::{ConversationHistory, HistoryEntry};
use crate::reference::ReferenceDocs;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ts_rs::TS;

pub const STATUS_OK: u16 = 200;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Body accepted by the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CodeRequest {
    pub prompt: String,
    /// Prior turns, oldest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub history: Option<Vec<HistoryEntry>>,
}

impl CodeRequest {
    /// Build a pipeline context; history is capped at `config.history_capacity`
    pub fn into_context(self, docs: Arc<ReferenceDocs>, config: &Config) -> PipelineContext {
        let context = PipelineContext::new(self.prompt, docs);
        match self.history {
            Some(entries) => context.with_history(ConversationHistory::from_entries(
                config.history_capacity,
                entries,
            )),
            None => context,
        }
    }
}

/// Error record returned with status 500
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResult {
    pub error: String,
    pub raw_or_detail: String,
}

impl From<PipelineFailure> for ErrorResult {
    fn from(failure: PipelineFailure) -> Self {
        Self {
            error: failure.error,
            raw_or_detail: failure.raw_or_detail,
        }
    }
}

/// Body returned by the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum CodeResponse {
    Artifact(GeneratedArtifact),
    Error(ErrorResult),
}

/// Map a pipeline outcome to a status code and body
pub fn respond(outcome: Result<GeneratedArtifact, PipelineFailure>) -> (u16, CodeResponse) {
    match outcome {
        Ok(artifact) => (STATUS_OK, CodeResponse::Artifact(artifact)),
        Err(failure) => (STATUS_INTERNAL_ERROR, CodeResponse::Error(failure.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::FailureState;

    #[test]
    fn test_success_maps_to_200() {
        let (status, body) = respond(Ok(GeneratedArtifact::new("c()", "i()")));
        assert_eq!(status, STATUS_OK);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"code": "c()", "interval": "i()"})
        );
    }

    #[test]
    fn test_failure_maps_to_500() {
        let failure = PipelineFailure {
            state: FailureState::ParseFailed,
            error: "Generated output not valid JSON".to_string(),
            raw_or_detail: "Sure! Here you go".to_string(),
        };
        let (status, body) = respond(Err(failure));
        assert_eq!(status, STATUS_INTERNAL_ERROR);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "error": "Generated output not valid JSON",
                "raw_or_detail": "Sure! Here you go"
            })
        );
    }

    #[test]
    fn test_request_without_history() {
        let request: CodeRequest =
            serde_json::from_str(r#"{"prompt": "DCA 1 KDA into zUSD daily"}"#).unwrap();
        let context = request.into_context(Arc::new(ReferenceDocs::kadena()), &Config::default());

        assert_eq!(context.prompt, "DCA 1 KDA into zUSD daily");
        assert!(context.history.is_none());
    }

    #[test]
    fn test_request_history_is_capped() {
        let request: CodeRequest = serde_json::from_value(serde_json::json!({
            "prompt": "again",
            "history": [
                {"speaker": "human", "content": "one"},
                {"speaker": "ai", "content": "two"},
                {"speaker": "human", "content": "three"}
            ]
        }))
        .unwrap();

        let config = Config {
            history_capacity: 2,
            ..Config::default()
        };
        let context = request.into_context(Arc::new(ReferenceDocs::kadena()), &config);
        let history = context.history.expect("history expected");
        assert_eq!(history.render(), "AI: two\nHuman: three");
    }

    #[test]
    fn test_response_deserializes_either_shape() {
        let ok: CodeResponse =
            serde_json::from_str(r#"{"code": "c()", "interval": "i()"}"#).unwrap();
        assert!(matches!(ok, CodeResponse::Artifact(_)));

        let err: CodeResponse =
            serde_json::from_str(r#"{"error": "e", "raw_or_detail": "d"}"#).unwrap();
        assert!(matches!(err, CodeResponse::Error(_)));
    }
}
