//! # Bulk Indexer Repository
//!
//! This crate provides the document store capability consumed by the bulk
//! load pipeline. It includes definitions for errors, the store interface,
//! index settings, and a concrete implementation for OpenSearch.

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod settings;

pub use errors::StoreError;
pub use interfaces::{DocumentStore, IndexCreation};
pub use opensearch::OpenSearchStore;
pub use settings::{IndexSettings, RefreshInterval};
