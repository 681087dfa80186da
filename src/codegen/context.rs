//! Per-run inputs: the strategy prompt, reference docs and prior dialogue

use crate::history::ConversationHistory;
use crate::reference::ReferenceDocs;
use std::sync::Arc;

/// Inputs for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Natural-language strategy description
    pub prompt: String,
    /// Reference documentation, shared across runs
    pub docs: Arc<ReferenceDocs>,
    /// Prior exchanges for conversational runs
    pub history: Option<ConversationHistory>,
}

impl PipelineContext {
    pub fn new(prompt: impl Into<String>, docs: Arc<ReferenceDocs>) -> Self {
        Self {
            prompt: prompt.into(),
            docs,
            history: None,
        }
    }

    pub fn with_history(mut self, history: ConversationHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// Rendered dialogue, or `None` when there is nothing to show
    pub fn dialogue(&self) -> Option<String> {
        self.history
            .as_ref()
            .filter(|history| !history.is_empty())
            .map(ConversationHistory::render)
    }
}
