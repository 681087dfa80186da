//! Error types for the code generation agent

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Model returned an empty completion")]
    EmptyCompletion,
}

pub type Result<T> = std::result::Result<T, Error>;
