//! Error types for the bulk indexer repository.

mod store_error;

pub use store_error::StoreError;
