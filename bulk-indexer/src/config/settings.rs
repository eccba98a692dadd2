//! Settings read from the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::IndexingError;
use bulk_indexer_pipeline::config::{
    DEFAULT_BULK_SIZE, DEFAULT_CHANNEL_BUFFER_SIZE, DEFAULT_CONSUMERS,
};
use bulk_indexer_pipeline::workgroup::DEFAULT_PROBE_INTERVAL;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default document type.
const DEFAULT_DOCUMENT_TYPE: &str = "_doc";

/// Default field holding the document id in input lines.
const DEFAULT_ID_FIELD: &str = "id";

/// Everything the binary needs to build a workgroup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub opensearch_url: String,
    pub index_name: String,
    pub document_type: String,
    pub consumers: usize,
    pub bulk_size: usize,
    pub channel_buffer_size: usize,
    pub input_file: PathBuf,
    pub id_field: String,
    pub mapping_file: Option<PathBuf>,
    pub stop_file: Option<PathBuf>,
    pub stop_probe_interval: Duration,
    pub allow_existing_index: bool,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `BULK_INDEX_NAME`: Destination index (required)
    /// - `BULK_INPUT_FILE`: NDJSON file to load (required)
    /// - `BULK_DOCUMENT_TYPE`: Document type (default: _doc)
    /// - `BULK_ID_FIELD`: Field holding the document id (default: id)
    /// - `BULK_CONSUMERS`: Number of consumer tasks (default: 4)
    /// - `BULK_SIZE`: Documents per bulk batch (default: 1000)
    /// - `BULK_CHANNEL_BUFFER`: Document channel capacity (default: 1000)
    /// - `BULK_MAPPING_FILE`: JSON mapping definition applied to the index
    /// - `BULK_STOP_FILE`: Stop the load once this file exists
    /// - `BULK_STOP_PROBE_SECS`: Seconds between stop file checks (default: 5)
    /// - `BULK_ALLOW_EXISTING_INDEX`: Load into an existing index (default: false)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`, which returns a variable's value if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, IndexingError> {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| IndexingError::config(format!("{} must be set", name)))
        };

        Ok(Self {
            opensearch_url: lookup("OPENSEARCH_URL")
                .unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            index_name: required("BULK_INDEX_NAME")?,
            document_type: lookup("BULK_DOCUMENT_TYPE")
                .unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string()),
            consumers: parse_or(&lookup, "BULK_CONSUMERS", DEFAULT_CONSUMERS)?,
            bulk_size: parse_or(&lookup, "BULK_SIZE", DEFAULT_BULK_SIZE)?,
            channel_buffer_size: parse_or(
                &lookup,
                "BULK_CHANNEL_BUFFER",
                DEFAULT_CHANNEL_BUFFER_SIZE,
            )?,
            input_file: PathBuf::from(required("BULK_INPUT_FILE")?),
            id_field: lookup("BULK_ID_FIELD").unwrap_or_else(|| DEFAULT_ID_FIELD.to_string()),
            mapping_file: lookup("BULK_MAPPING_FILE").map(PathBuf::from),
            stop_file: lookup("BULK_STOP_FILE").map(PathBuf::from),
            stop_probe_interval: parse_probe_interval(&lookup)?,
            allow_existing_index: parse_or(&lookup, "BULK_ALLOW_EXISTING_INDEX", false)?,
        })
    }
}

fn parse_probe_interval(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Duration, IndexingError> {
    let name = "BULK_STOP_PROBE_SECS";
    match lookup(name) {
        Some(raw) => match parse_value::<u64>(name, &raw)? {
            0 => Err(IndexingError::config(format!("{} must be > 0", name))),
            secs => Ok(Duration::from_secs(secs)),
        },
        None => Ok(DEFAULT_PROBE_INTERVAL),
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, IndexingError> {
    match lookup(name) {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T, IndexingError> {
    raw.trim()
        .parse()
        .map_err(|_| IndexingError::config(format!("{} has an invalid value: {}", name, raw)))
}
