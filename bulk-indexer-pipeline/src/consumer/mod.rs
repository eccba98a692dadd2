//! Batch consumer.
//!
//! Each consumer drains the shared document channel into a batch of
//! `bulk_size` documents and writes full batches to the store in one round
//! trip. The final partial batch is flushed once the channel is closed and
//! empty.

use async_channel::Receiver;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::cancellation::StopHandle;
use crate::errors::PipelineError;
use bulk_indexer_repository::DocumentStore;
use bulk_indexer_shared::Document;

/// Number of attempts made for one batch before giving up.
pub const MAX_SUBMIT_ATTEMPTS: u32 = 5;

/// A progress line is logged every time a consumer crosses this many documents.
const PROGRESS_LOG_INTERVAL: u64 = 5000;

/// Callback invoked with the size of every successfully written batch.
pub type PushCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// How a consumer left its loop.
#[derive(Debug)]
pub(crate) enum ConsumerExit {
    /// The channel was closed and fully drained.
    Drained,
    /// The stop flag was observed; the partial batch was dropped.
    Stopped { dropped: usize },
    /// A batch could not be written.
    Failed(PipelineError),
}

/// Per-consumer totals handed back to the workgroup.
#[derive(Debug)]
pub(crate) struct ConsumerReport {
    pub documents: u64,
    pub batches: u64,
    pub exit: ConsumerExit,
}

/// One worker draining the shared channel.
pub(crate) struct BatchConsumer {
    id: usize,
    store: Arc<dyn DocumentStore>,
    index: String,
    document_type: String,
    bulk_size: usize,
    stop: StopHandle,
    on_push: Option<PushCallback>,
}

impl BatchConsumer {
    pub(crate) fn new(
        id: usize,
        store: Arc<dyn DocumentStore>,
        index: impl Into<String>,
        document_type: impl Into<String>,
        bulk_size: usize,
        stop: StopHandle,
        on_push: Option<PushCallback>,
    ) -> Self {
        Self {
            id,
            store,
            index: index.into(),
            document_type: document_type.into(),
            bulk_size,
            stop,
            on_push,
        }
    }

    /// Consume until the channel is closed and drained, the stop flag is
    /// raised, or a batch exhausts its retries.
    ///
    /// A retry exhaustion raises the shared stop flag so the producer and
    /// sibling consumers wind down too.
    #[instrument(skip(self, receiver), fields(consumer = self.id))]
    pub(crate) async fn consume(self, receiver: Receiver<Document>) -> ConsumerReport {
        let mut documents = 0u64;
        let mut batches = 0u64;
        let mut next_progress = PROGRESS_LOG_INTERVAL;
        let mut batch: Vec<Document> = Vec::with_capacity(self.bulk_size);

        loop {
            if self.stop.should_stop() {
                return Self::stopped(documents, batches, batch.len());
            }

            let document = match receiver.recv().await {
                Ok(document) => document,
                // Closed and empty.
                Err(_) => break,
            };

            batch.push(document);
            if batch.len() < self.bulk_size {
                continue;
            }

            if let Err(e) = self.submit(&batch).await {
                self.stop.request_stop();
                return ConsumerReport {
                    documents,
                    batches,
                    exit: ConsumerExit::Failed(e),
                };
            }

            documents += batch.len() as u64;
            batches += 1;
            batch.clear();

            if documents >= next_progress {
                info!(documents = documents, "Pushed documents to the index");
                next_progress += PROGRESS_LOG_INTERVAL;
            }
        }

        // The channel may have been closed because of a stop.
        if self.stop.should_stop() {
            return Self::stopped(documents, batches, batch.len());
        }

        if !batch.is_empty() {
            if let Err(e) = self.submit(&batch).await {
                self.stop.request_stop();
                return ConsumerReport {
                    documents,
                    batches,
                    exit: ConsumerExit::Failed(e),
                };
            }
            documents += batch.len() as u64;
            batches += 1;
        }

        info!(
            documents = documents,
            batches = batches,
            "Consuming finished"
        );

        ConsumerReport {
            documents,
            batches,
            exit: ConsumerExit::Drained,
        }
    }

    fn stopped(documents: u64, batches: u64, dropped: usize) -> ConsumerReport {
        if dropped > 0 {
            warn!(dropped = dropped, "Stop requested, dropping partial batch");
        }
        info!(documents = documents, "Consumer stopped");
        ConsumerReport {
            documents,
            batches,
            exit: ConsumerExit::Stopped { dropped },
        }
    }

    /// Write one batch, retrying immediately up to `MAX_SUBMIT_ATTEMPTS`.
    pub(crate) async fn submit(&self, batch: &[Document]) -> Result<(), PipelineError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self
                .store
                .submit_bulk(&self.index, &self.document_type, batch)
                .await
            {
                Ok(()) => break,
                Err(e) if attempt < MAX_SUBMIT_ATTEMPTS => {
                    warn!(
                        attempt = attempt,
                        max_attempts = MAX_SUBMIT_ATTEMPTS,
                        count = batch.len(),
                        error = %e,
                        "Bulk submission failed, retrying"
                    );
                }
                Err(e) => {
                    error!(
                        attempts = attempt,
                        count = batch.len(),
                        error = %e,
                        "Unable to submit bulk batch, aborting consumer"
                    );
                    return Err(PipelineError::SubmissionError {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }

        debug!(count = batch.len(), attempts = attempt, "Bulk batch submitted");
        if let Some(callback) = &self.on_push {
            callback(batch.len());
        }
        Ok(())
    }
}
