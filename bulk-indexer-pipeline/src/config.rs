//! Workgroup configuration.

use serde_json::Value;
use std::path::Path;

use crate::errors::PipelineError;

/// Smallest batch size accepted; smaller batches defeat bulk submission.
pub const MIN_BULK_SIZE: usize = 100;

/// Default number of consumer tasks.
pub const DEFAULT_CONSUMERS: usize = 4;

/// Default number of documents per bulk batch.
pub const DEFAULT_BULK_SIZE: usize = 1000;

/// Default capacity of the document channel.
pub const DEFAULT_CHANNEL_BUFFER_SIZE: usize = 1000;

/// Configuration for a workgroup run.
#[derive(Debug, Clone)]
pub struct WorkgroupConfig {
    /// Destination index.
    pub index_name: String,
    /// Document type the mapping and batches are submitted under.
    pub document_type: String,
    /// Number of consumer tasks draining the channel.
    pub num_consumers: usize,
    /// Number of documents per bulk batch.
    pub bulk_size: usize,
    /// Capacity of the document channel. 0 is treated as 1.
    pub channel_buffer_size: usize,
    /// Optional field mapping applied after index creation.
    pub mapping: Option<Value>,
    /// Fail the run when the index cannot be created, e.g. because it
    /// already exists.
    pub fail_on_duplicate_index: bool,
}

impl WorkgroupConfig {
    /// Create a configuration with default sizing.
    pub fn new(index_name: impl Into<String>, document_type: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            document_type: document_type.into(),
            num_consumers: DEFAULT_CONSUMERS,
            bulk_size: DEFAULT_BULK_SIZE,
            channel_buffer_size: DEFAULT_CHANNEL_BUFFER_SIZE,
            mapping: None,
            fail_on_duplicate_index: true,
        }
    }

    /// Set the number of consumer tasks.
    pub fn with_consumers(mut self, num_consumers: usize) -> Self {
        self.num_consumers = num_consumers;
        self
    }

    /// Set the bulk batch size.
    pub fn with_bulk_size(mut self, bulk_size: usize) -> Self {
        self.bulk_size = bulk_size;
        self
    }

    /// Set the document channel capacity.
    pub fn with_channel_buffer_size(mut self, channel_buffer_size: usize) -> Self {
        self.channel_buffer_size = channel_buffer_size;
        self
    }

    /// Set the field mapping definition.
    pub fn with_mapping(mut self, mapping: Value) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Read the field mapping definition from a JSON file.
    pub fn with_mapping_file(self, path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let mapping = read_mapping_file(path.as_ref())?;
        Ok(self.with_mapping(mapping))
    }

    /// Set whether an index creation failure aborts the run.
    pub fn with_fail_on_duplicate_index(mut self, fail: bool) -> Self {
        self.fail_on_duplicate_index = fail;
        self
    }

    /// Check the configuration.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the configuration can be run
    /// * `Err(PipelineError::ConfigError)` - Describing the first violation
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.index_name.trim().is_empty() {
            return Err(PipelineError::config("index name must not be empty"));
        }

        if self.num_consumers == 0 {
            return Err(PipelineError::config("number of consumers must be > 0"));
        }

        if self.bulk_size == 0 {
            return Err(PipelineError::config("bulk size must be > 0"));
        }

        if self.bulk_size < MIN_BULK_SIZE {
            return Err(PipelineError::config(format!(
                "bulk size {} is below the minimum of {}",
                self.bulk_size, MIN_BULK_SIZE
            )));
        }

        Ok(())
    }
}

/// Read and parse a JSON mapping definition.
pub(crate) fn read_mapping_file(path: &Path) -> Result<Value, PipelineError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        PipelineError::config(format!(
            "unable to read mapping file {}: {}",
            path.display(),
            e
        ))
    })?;

    serde_json::from_str(&raw).map_err(|e| {
        PipelineError::config(format!(
            "invalid mapping file {}: {}",
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_are_valid() {
        let config = WorkgroupConfig::new("books", "_doc");

        assert!(config.validate().is_ok());
        assert!(config.fail_on_duplicate_index);
        assert!(config.mapping.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_consumers() {
        let config = WorkgroupConfig::new("books", "_doc").with_consumers(0);
        assert!(matches!(
            config.validate(),
            Err(PipelineError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_small_bulk_sizes() {
        for bulk_size in [0, 1, 50, 99] {
            let config = WorkgroupConfig::new("books", "_doc").with_bulk_size(bulk_size);
            assert!(config.validate().is_err(), "bulk size {} accepted", bulk_size);
        }

        let config = WorkgroupConfig::new("books", "_doc").with_bulk_size(MIN_BULK_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_index() {
        let config = WorkgroupConfig::new("  ", "_doc");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_channel_buffer_is_valid() {
        let config = WorkgroupConfig::new("books", "_doc").with_channel_buffer_size(0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mapping_file() {
        let path = std::env::temp_dir().join("bulk_indexer_mapping_test.json");
        std::fs::write(&path, r#"{"properties": {"title": {"type": "text"}}}"#).unwrap();

        let config = WorkgroupConfig::new("books", "_doc")
            .with_mapping_file(&path)
            .unwrap();

        assert_eq!(
            config.mapping,
            Some(json!({"properties": {"title": {"type": "text"}}}))
        );
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_mapping_file_missing() {
        let result = WorkgroupConfig::new("books", "_doc")
            .with_mapping_file("/nonexistent/bulk_indexer/mapping.json");

        assert!(matches!(result, Err(PipelineError::ConfigError(_))));
    }
}
