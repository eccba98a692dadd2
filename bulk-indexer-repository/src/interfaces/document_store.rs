//! Document store trait definition.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StoreError;
use crate::settings::IndexSettings;
use bulk_indexer_shared::Document;

/// Result of an index creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCreation {
    /// The index did not exist and was created.
    Created,
    /// An index with that name was already present.
    AlreadyExists,
}

/// Abstract interface for the operations the bulk loader needs from a store.
///
/// Implementations are injected into the workgroup, so tests can swap in
/// mocks and backends can change without touching the pipeline.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`: one instance is shared by every
/// consumer task.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create the named index.
    ///
    /// # Returns
    ///
    /// * `Ok(IndexCreation::Created)` - If the index was created
    /// * `Ok(IndexCreation::AlreadyExists)` - If the index was already there
    /// * `Err(StoreError)` - If creation fails for any other reason
    async fn create_index(&self, index: &str) -> Result<IndexCreation, StoreError>;

    /// Apply replica and refresh settings to the named index.
    async fn apply_settings(&self, index: &str, settings: &IndexSettings)
        -> Result<(), StoreError>;

    /// Apply a field mapping definition for `document_type` documents.
    async fn apply_mapping(
        &self,
        index: &str,
        document_type: &str,
        mapping: &Value,
    ) -> Result<(), StoreError>;

    /// Write a batch of documents in a single round trip.
    ///
    /// The batch succeeds or fails as a whole; item-level failures reported
    /// by the store are surfaced as `StoreError::BulkError`.
    async fn submit_bulk(
        &self,
        index: &str,
        document_type: &str,
        documents: &[Document],
    ) -> Result<(), StoreError>;
}
