//! # Bulk Indexer
//!
//! Entry point and configuration for loading an NDJSON file into an
//! OpenSearch index through the bulk load pipeline.

pub mod config;
pub mod generator;

pub use config::{Dependencies, Settings};
pub use generator::NdjsonGenerator;

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] bulk_indexer_pipeline::PipelineError),

    /// Store error.
    #[error("Store error: {0}")]
    StoreError(#[from] bulk_indexer_repository::StoreError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
