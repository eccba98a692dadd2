//! OpenSearch store implementation.
//!
//! This module provides the concrete implementation of `DocumentStore`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesPutMappingParts, IndicesPutSettingsParts},
    BulkParts, OpenSearch,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::StoreError;
use crate::interfaces::{DocumentStore, IndexCreation};
use crate::opensearch::bulk::{bulk_lines, check_bulk_response};
use crate::settings::IndexSettings;
use bulk_indexer_shared::Document;

/// Error type OpenSearch reports when creating an index that already exists.
const ALREADY_EXISTS_ERROR: &str = "resource_already_exists_exception";

/// OpenSearch store implementation.
///
/// # Example
///
/// ```ignore
/// let store = OpenSearchStore::new("http://localhost:9200").await?;
/// store.create_index("books").await?;
/// store.apply_settings("books", &IndexSettings::write_optimized()).await?;
/// ```
pub struct OpenSearchStore {
    client: OpenSearch,
}

impl OpenSearchStore {
    /// Create a new store connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchStore)` - A new store instance
    /// * `Err(StoreError)` - If the URL is invalid or transport setup fails
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let parsed_url = Url::parse(url).map_err(|e| StoreError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch store");

        Ok(Self { client })
    }

    /// Check if the cluster is reachable and not red.
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Ok(false);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::parse(e.to_string()))?;

        let status = body.get("status").and_then(|s| s.as_str()).unwrap_or("red");
        debug!(status = %status, "Cluster health");

        Ok(status != "red")
    }

    /// Read the body of a non-successful response for error reporting.
    async fn failure_body(response: Response) -> (u16, String) {
        let status = response.status_code().as_u16();
        let body = response.text().await.unwrap_or_default();
        (status, body)
    }
}

#[async_trait]
impl DocumentStore for OpenSearchStore {
    #[instrument(skip(self))]
    async fn create_index(&self, index: &str) -> Result<IndexCreation, StoreError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .send()
            .await
            .map_err(|e| StoreError::index_creation(e.to_string()))?;

        if response.status_code().is_success() {
            info!(index = %index, "Created index");
            return Ok(IndexCreation::Created);
        }

        let (status, body) = Self::failure_body(response).await;
        if status == 400 && body.contains(ALREADY_EXISTS_ERROR) {
            debug!(index = %index, "Index already exists");
            return Ok(IndexCreation::AlreadyExists);
        }

        error!(status = status, body = %body, "Index creation failed");
        Err(StoreError::index_creation(format!(
            "Create index failed with status {}: {}",
            status, body
        )))
    }

    #[instrument(skip(self))]
    async fn apply_settings(
        &self,
        index: &str,
        settings: &IndexSettings,
    ) -> Result<(), StoreError> {
        let indices = [index];
        let response = self
            .client
            .indices()
            .put_settings(IndicesPutSettingsParts::Index(&indices))
            .body(settings.to_json())
            .send()
            .await
            .map_err(|e| StoreError::settings(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, body) = Self::failure_body(response).await;
            error!(status = status, body = %body, "Settings update failed");
            return Err(StoreError::settings(format!(
                "Settings update failed with status {}: {}",
                status, body
            )));
        }

        debug!(index = %index, "Index settings applied");
        Ok(())
    }

    #[instrument(skip(self, mapping))]
    async fn apply_mapping(
        &self,
        index: &str,
        document_type: &str,
        mapping: &Value,
    ) -> Result<(), StoreError> {
        // Mapping types no longer exist server side; one mapping per index.
        let indices = [index];
        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&indices))
            .body(mapping.clone())
            .send()
            .await
            .map_err(|e| StoreError::mapping(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, body) = Self::failure_body(response).await;
            error!(status = status, body = %body, "Mapping update failed");
            return Err(StoreError::mapping(format!(
                "Mapping update failed with status {}: {}",
                status, body
            )));
        }

        debug!(index = %index, document_type = %document_type, "Index mapping applied");
        Ok(())
    }

    async fn submit_bulk(
        &self,
        index: &str,
        document_type: &str,
        documents: &[Document],
    ) -> Result<(), StoreError> {
        let body: Vec<JsonBody<Value>> = bulk_lines(index, documents)
            .into_iter()
            .map(JsonBody::from)
            .collect();

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::bulk(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, body) = Self::failure_body(response).await;
            return Err(StoreError::bulk(format!(
                "Bulk request failed with status {}: {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::parse(e.to_string()))?;
        check_bulk_response(&body)?;

        debug!(
            index = %index,
            document_type = %document_type,
            count = documents.len(),
            "Bulk batch written"
        );
        Ok(())
    }
}
