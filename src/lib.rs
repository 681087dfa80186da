//! Trading-agent code generation
//!
//! Turns a natural-language strategy into a `{code, interval}` JavaScript
//! artifact for the Kadena trading runtime:
//! - Drafts the code with a generation model
//! - Runs a tree-sitter syntax check and shallow lint heuristics
//! - Always passes the draft and its diagnostics through a guardrail model
//!   whose output is the final artifact
//!
//! # Failure Model
//!
//! - Transport errors and malformed model output end the run
//! - Diagnostics never end a run; they are forwarded to the guardrail
//! - A caller gets a repaired artifact or an explicit error, never the
//!   unrepaired draft

pub mod api;
pub mod artifact;
pub mod audit;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod history;
pub mod llm;
pub mod reference;

mod error;

// Re-export commonly used types
pub use artifact::GeneratedArtifact;
pub use codegen::{CodeGenerationPipeline, PipelineContext, PipelineFailure};
pub use config::{Config, LlmEndpoint};
pub use error::{Error, Result};
pub use reference::ReferenceDocs;
