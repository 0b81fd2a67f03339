use thiserror::Error;
use std::path::PathBuf;

/// The main result type for kinesis-core operations.
pub type KinesisResult<T> = Result<T, KinesisError>;

/// Enum representing possible errors within the kinesis-core library.
#[derive(Error, Debug)]
pub enum KinesisError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Wrong rank, wrong column count or ragged rows. `actual` is the offending shape.
    #[error("Embedding shape mismatch: expected (n, {expected}), got {actual:?}")]
    ShapeMismatch { expected: usize, actual: Vec<usize> },

    #[error("Index not initialized: insert vectors or load an index first")]
    NotInitialized,

    #[error("Document count mismatch: {vectors} vectors but {documents} documents")]
    DocumentCountMismatch { vectors: usize, documents: usize },

    #[error("Persisted index has dimension {actual}, store is configured for {expected}")]
    IncompatibleIndex { expected: usize, actual: usize },

    #[error("I/O error accessing path {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Corrupted index file: {0}")]
    Corrupted(String),
}

impl KinesisError {
    /// Wraps an I/O error with the path it happened on.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KinesisError::IoError { path: path.into(), source }
    }
}
