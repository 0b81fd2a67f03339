use std::path::PathBuf;
use thiserror::Error;
use kinesis_core::KinesisError; // Import core errors

use crate::workflow::Stage;

/// Pipeline-specific error types.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Core store error: {0}")]
    Store(#[from] KinesisError), // Automatically convert from KinesisError

    #[error("I/O error accessing path {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed source file: {0}")]
    MalformedSource(String),

    #[error("Malformed record on line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("Prompt template references '{0}' but no value was supplied")]
    MissingVariable(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Stage {stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io { path: path.into(), source }
    }
}

// Define a Result type alias for pipeline functions
pub type PipelineResult<T> = Result<T, PipelineError>;
