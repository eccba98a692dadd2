//! Store error types.
//!
//! This module defines the error types that can occur while talking to the
//! document store.

use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Failed to establish connection to the store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to create the destination index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to apply index settings.
    #[error("Settings error: {0}")]
    SettingsError(String),

    /// Failed to apply the field mapping.
    #[error("Mapping error: {0}")]
    MappingError(String),

    /// A bulk submission failed or reported item failures.
    #[error("Bulk error: {0}")]
    BulkError(String),

    /// Failed to parse response from the store.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the store.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a settings error.
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::SettingsError(msg.into())
    }

    /// Create a mapping error.
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::MappingError(msg.into())
    }

    /// Create a bulk error.
    pub fn bulk(msg: impl Into<String>) -> Self {
        Self::BulkError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}
