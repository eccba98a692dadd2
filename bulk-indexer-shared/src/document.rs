//! The unit of work flowing through the bulk load pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document to be written to the destination index.
///
/// The payload is opaque to the pipeline; it is handed to the store as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier the store indexes the document under.
    pub id: String,
    /// Document body.
    pub payload: Value,
}

impl Document {
    /// Create a new document.
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}
