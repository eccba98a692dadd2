//! Index settings toggled around a bulk load.
//!
//! During the load the index runs without replicas and with refresh turned
//! off so every write goes straight to the primary shards. Once the load is
//! over the serving profile is put back.

use serde_json::{json, Value};
use std::time::Duration;

/// How often the index refreshes to make new writes searchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshInterval {
    /// No periodic refresh.
    Disabled,
    /// Refresh on a fixed interval.
    Every(Duration),
}

impl RefreshInterval {
    /// Render the interval the way the store expects it in settings.
    pub fn as_setting(&self) -> String {
        match self {
            RefreshInterval::Disabled => "-1".to_string(),
            RefreshInterval::Every(interval) if interval.subsec_millis() == 0 => {
                format!("{}s", interval.as_secs())
            }
            RefreshInterval::Every(interval) => format!("{}ms", interval.as_millis()),
        }
    }
}

/// Replica and refresh configuration of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSettings {
    pub number_of_replicas: u32,
    pub refresh_interval: RefreshInterval,
}

impl IndexSettings {
    /// Settings applied while documents are being bulk loaded.
    pub fn write_optimized() -> Self {
        Self {
            number_of_replicas: 0,
            refresh_interval: RefreshInterval::Disabled,
        }
    }

    /// Settings restored once the load has finished.
    pub fn serving_optimized() -> Self {
        Self {
            number_of_replicas: 1,
            refresh_interval: RefreshInterval::Every(Duration::from_secs(10)),
        }
    }

    /// Body for an index settings update request.
    pub fn to_json(&self) -> Value {
        json!({
            "index": {
                "number_of_replicas": self.number_of_replicas,
                "refresh_interval": self.refresh_interval.as_setting()
            }
        })
    }
}
