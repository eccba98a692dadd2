//! # Bulk Indexer Shared
//!
//! Types shared between the store implementations and the loading pipeline.

mod document;

pub use document::Document;
