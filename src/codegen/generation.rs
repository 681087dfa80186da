//! First model call: strategy prompt to raw `{code, interval}` text

use super::context::PipelineContext;
use super::prompts::generation_system_prompt;
use crate::llm::TextGenerator;
use crate::Result;
use std::sync::Arc;

/// Stateless client for the generation call
#[derive(Clone)]
pub struct GenerationClient {
    generator: Arc<dyn TextGenerator>,
}

impl GenerationClient {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Send the composed instruction with the strategy prompt as the only
    /// user content. Returns the raw completion; parsing is the caller's job.
    pub async fn generate(&self, context: &PipelineContext) -> Result<String> {
        let dialogue = context.dialogue();
        let system = generation_system_prompt(&context.docs, dialogue.as_deref());

        tracing::info!(
            model = %self.generator.model(),
            prompt_len = context.prompt.len(),
            with_history = dialogue.is_some(),
            "Generating strategy code"
        );

        self.generator.invoke(&system, &context.prompt).await
    }
}
