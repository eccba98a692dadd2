//! Error types for the bulk indexer pipeline.

use bulk_indexer_repository::StoreError;
use thiserror::Error;

/// Errors that can occur in the bulk indexer pipeline.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// The workgroup configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The startup hook declined to start the run.
    #[error("Startup hook rejected the run")]
    StartupRejected,

    /// Index creation, mapping or settings failed before the load.
    #[error("Provisioning error: {0}")]
    ProvisioningError(#[from] StoreError),

    /// A batch could not be written within the retry ceiling.
    #[error("Bulk submission failed after {attempts} attempts: {source}")]
    SubmissionError { attempts: u32, source: StoreError },

    /// Serving settings could not be restored after the load.
    #[error("Settings restoration error: {0}")]
    RestoreError(StoreError),

    /// The document generator reported an error.
    #[error("Generator error: {0}")]
    GeneratorError(String),

    /// Every consumer has gone away; no more documents can be pushed.
    #[error("Document channel closed")]
    ChannelClosed,

    /// A pipeline task panicked or was aborted.
    #[error("Task error: {0}")]
    TaskError(String),

    /// The workgroup was already run once.
    #[error("Workgroup has already run")]
    AlreadyRan,
}

impl PipelineError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a generator error.
    pub fn generator(msg: impl Into<String>) -> Self {
        Self::GeneratorError(msg.into())
    }

    /// Create a task error.
    pub fn task(msg: impl Into<String>) -> Self {
        Self::TaskError(msg.into())
    }
}
