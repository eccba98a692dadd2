//! Dependency initialization and wiring for the bulk indexer.

use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::generator::NdjsonGenerator;
use crate::IndexingError;
use bulk_indexer_pipeline::{Workgroup, WorkgroupConfig};
use bulk_indexer_repository::OpenSearchStore;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured workgroup ready to run.
    pub workgroup: Workgroup,
}

impl Dependencies {
    /// Connect to OpenSearch, open the input and build the workgroup.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If the cluster is unreachable or unhealthy,
    ///   the input cannot be opened, or the configuration is invalid
    pub async fn new(settings: &Settings) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            index = %settings.index_name,
            input = %settings.input_file.display(),
            consumers = settings.consumers,
            bulk_size = settings.bulk_size,
            "Initializing dependencies"
        );

        let store = OpenSearchStore::new(&settings.opensearch_url).await?;

        let healthy = store.health_check().await?;

        if !healthy {
            return Err(IndexingError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        let generator =
            NdjsonGenerator::open(&settings.input_file, settings.id_field.clone()).await?;

        let mut config = WorkgroupConfig::new(&settings.index_name, &settings.document_type)
            .with_consumers(settings.consumers)
            .with_bulk_size(settings.bulk_size)
            .with_channel_buffer_size(settings.channel_buffer_size)
            .with_fail_on_duplicate_index(!settings.allow_existing_index);

        if let Some(mapping_file) = &settings.mapping_file {
            config = config.with_mapping_file(mapping_file)?;
            info!(path = %mapping_file.display(), "Loaded index mapping");
        }

        let mut workgroup = Workgroup::new(config, Arc::new(store), generator)?;

        if let Some(stop_file) = settings.stop_file.clone() {
            info!(
                path = %stop_file.display(),
                interval_secs = settings.stop_probe_interval.as_secs(),
                "Watching for stop file"
            );
            workgroup.set_stop_probe(move || stop_file.exists(), settings.stop_probe_interval)?;
        }

        Ok(Self { workgroup })
    }
}
