//! # Bulk Indexer Pipeline
//!
//! This crate provides the pipeline that bulk loads a stream of documents
//! into a search index.
//!
//! ## Architecture
//!
//! The pipeline follows a single-producer, multi-consumer pattern:
//!
//! 1. **Producer**: Wraps a user supplied generator and pushes documents
//!    onto a bounded channel
//! 2. **Consumer**: Each worker drains the shared channel into fixed size
//!    batches and submits them with bounded retry
//! 3. **Workgroup**: Provisions the index with write-optimized settings,
//!    runs the producer and consumers, then restores serving settings
//!
//! Cancellation is cooperative: a shared stop flag is checked by every
//! participant at well defined points.

pub mod cancellation;
pub mod config;
pub mod consumer;
pub mod errors;
pub mod producer;
pub mod workgroup;

#[cfg(test)]
pub(crate) mod testing;

pub use cancellation::StopHandle;
pub use config::WorkgroupConfig;
pub use errors::PipelineError;
pub use producer::{DocumentGenerator, IterGenerator, Producer};
pub use workgroup::{RunOutcome, RunStats, Workgroup};
