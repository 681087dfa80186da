//! Text-generation service seam
//!
//! Both pipeline stages talk to a model through [`TextGenerator`]. The
//! production implementation is [`OpenAiChatClient`]; tests substitute a
//! scripted fake.

mod openai;

pub use openai::{OpenAiChatClient, ResponseSchema};

use crate::Result;
use async_trait::async_trait;

/// A black-box text completion service
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send one system instruction and one user turn, returning the raw
    /// completion text.
    async fn invoke(&self, system: &str, user: &str) -> Result<String>;

    /// Model identifier, for logs and audit entries
    fn model(&self) -> &str;
}
