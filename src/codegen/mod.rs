//! Strategy code generation
//!
//! [`CodeGenerationPipeline`] drives two model calls through
//! [`GenerationClient`] and [`RepairClient`], with the static checks from
//! [`crate::diagnostics`] in between.

mod context;
mod generation;
mod pipeline;
pub mod prompts;
mod repair;

pub use context::PipelineContext;
pub use generation::GenerationClient;
pub use pipeline::{CodeGenerationPipeline, FailureState, PipelineFailure, PipelineState};
pub use repair::{RepairClient, RepairError};
