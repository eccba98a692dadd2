//! Producer side of the pipeline.
//!
//! A user supplied [`DocumentGenerator`] is handed a [`Producer`] and pushes
//! documents through it. The producer owns the sending half of the shared
//! channel; a full channel blocks `push`, which is the only backpressure the
//! pipeline applies.

use async_channel::Sender;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cancellation::StopHandle;
use crate::errors::PipelineError;
use bulk_indexer_shared::Document;

/// Callback invoked with the running produced-count.
pub type ProduceCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Source of the documents to load.
///
/// Implementations should call [`Producer::should_stop`] between documents
/// and return early once it is `true`; the pipeline never preempts them.
#[async_trait]
pub trait DocumentGenerator: Send {
    /// Push every document through `producer`.
    async fn generate(&mut self, producer: &mut Producer) -> Result<(), PipelineError>;
}

/// Generator over an in-memory sequence of documents.
pub struct IterGenerator<I> {
    documents: I,
}

impl<I> IterGenerator<I>
where
    I: Iterator<Item = Document>,
{
    /// Create a generator that yields `documents` in order.
    pub fn new(documents: impl IntoIterator<Item = Document, IntoIter = I>) -> Self {
        Self {
            documents: documents.into_iter(),
        }
    }
}

#[async_trait]
impl<I> DocumentGenerator for IterGenerator<I>
where
    I: Iterator<Item = Document> + Send,
{
    async fn generate(&mut self, producer: &mut Producer) -> Result<(), PipelineError> {
        for document in self.documents.by_ref() {
            if producer.should_stop() {
                break;
            }
            producer.push(document).await?;
        }
        Ok(())
    }
}

/// Push primitive handed to the generator.
pub struct Producer {
    sender: Sender<Document>,
    stop: StopHandle,
    produced: u64,
    on_produce: Option<ProduceCallback>,
}

impl Producer {
    pub(crate) fn new(
        sender: Sender<Document>,
        stop: StopHandle,
        on_produce: Option<ProduceCallback>,
    ) -> Self {
        Self {
            sender,
            stop,
            produced: 0,
            on_produce,
        }
    }

    /// Enqueue one document, waiting while the channel is full.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was enqueued
    /// * `Err(PipelineError::ChannelClosed)` - If every consumer has exited
    pub async fn push(&mut self, document: Document) -> Result<(), PipelineError> {
        self.sender
            .send(document)
            .await
            .map_err(|_| PipelineError::ChannelClosed)?;

        self.produced += 1;
        if let Some(callback) = &self.on_produce {
            callback(self.produced);
        }
        Ok(())
    }

    /// Whether the run has been asked to stop.
    pub fn should_stop(&self) -> bool {
        self.stop.should_stop()
    }

    /// Number of documents pushed so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }
}

/// What the producer task hands back to the workgroup.
#[derive(Debug)]
pub(crate) struct ProducerReport {
    pub produced: u64,
    pub error: Option<PipelineError>,
}

/// Drive `generator` to completion and report the final count.
///
/// The finished callback fires exactly once, however generation ended.
pub(crate) async fn run_producer(
    mut generator: Box<dyn DocumentGenerator>,
    mut producer: Producer,
    on_finished: Option<ProduceCallback>,
) -> ProducerReport {
    debug!("Producer started");
    let result = generator.generate(&mut producer).await;
    let produced = producer.produced();

    if let Some(callback) = &on_finished {
        callback(produced);
    }

    let error = match result {
        Ok(()) => None,
        // Consumers went away because the run is stopping.
        Err(PipelineError::ChannelClosed) if producer.should_stop() => None,
        Err(e) => {
            warn!(error = %e, produced = produced, "Production ended with an error");
            Some(e)
        }
    };

    info!(
        produced = produced,
        stopped = producer.should_stop(),
        "Production finished"
    );

    ProducerReport { produced, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn documents(count: usize) -> Vec<Document> {
        (0..count)
            .map(|i| Document::new(i.to_string(), json!({"value": format!("test_{}", i)})))
            .collect()
    }

    #[tokio::test]
    async fn test_push() {
        let (tx, rx) = async_channel::bounded(1);
        let mut producer = Producer::new(tx, StopHandle::new(), None);

        producer
            .push(Document::new("3", json!(["test1", "test2"])))
            .await
            .unwrap();

        assert_eq!(producer.produced(), 1);
        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, "3");
        assert_eq!(received.payload, json!(["test1", "test2"]));
    }

    #[tokio::test]
    async fn test_push_with_callback() {
        let last = Arc::new(AtomicU64::new(0));
        let seen = last.clone();
        let callback: ProduceCallback = Arc::new(move |count| seen.store(count, Ordering::SeqCst));

        let (tx, _rx) = async_channel::bounded(150);
        let mut producer = Producer::new(tx, StopHandle::new(), Some(callback));

        for doc in documents(150) {
            producer.push(doc).await.unwrap();
        }

        assert_eq!(last.load(Ordering::SeqCst), 150);
    }

    #[tokio::test]
    async fn test_push_without_consumers() {
        let (tx, rx) = async_channel::bounded(1);
        drop(rx);
        let mut producer = Producer::new(tx, StopHandle::new(), None);

        let result = producer.push(Document::new("1", json!({}))).await;

        assert!(matches!(result, Err(PipelineError::ChannelClosed)));
        assert_eq!(producer.produced(), 0);
    }

    #[tokio::test]
    async fn test_run_producer_reports_final_count() {
        let finished = Arc::new(AtomicU64::new(0));
        let seen = finished.clone();
        let on_finished: ProduceCallback =
            Arc::new(move |count| seen.store(count, Ordering::SeqCst));

        let (tx, rx) = async_channel::bounded(250);
        let producer = Producer::new(tx, StopHandle::new(), None);
        let generator = Box::new(IterGenerator::new(documents(250)));

        let report = run_producer(generator, producer, Some(on_finished)).await;

        assert_eq!(report.produced, 250);
        assert!(report.error.is_none());
        assert_eq!(finished.load(Ordering::SeqCst), 250);
        assert_eq!(rx.len(), 250);
    }

    #[tokio::test]
    async fn test_generator_observes_stop() {
        let stop = StopHandle::new();
        stop.request_stop();

        let (tx, rx) = async_channel::bounded(10);
        let producer = Producer::new(tx, stop, None);
        let generator = Box::new(IterGenerator::new(documents(10)));

        let report = run_producer(generator, producer, None).await;

        assert_eq!(report.produced, 0);
        assert!(rx.is_empty());
    }

    #[tokio::test]
    async fn test_channel_closed_while_stopping_is_not_an_error() {
        let stop = StopHandle::new();
        let (tx, rx) = async_channel::bounded(1);
        drop(rx);
        let producer = Producer::new(tx, stop.clone(), None);

        struct StopThenPush(StopHandle);

        #[async_trait]
        impl DocumentGenerator for StopThenPush {
            async fn generate(&mut self, producer: &mut Producer) -> Result<(), PipelineError> {
                self.0.request_stop();
                producer.push(Document::new("1", json!({}))).await
            }
        }

        let report = run_producer(Box::new(StopThenPush(stop)), producer, None).await;

        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn test_generator_error_is_reported() {
        struct Failing;

        #[async_trait]
        impl DocumentGenerator for Failing {
            async fn generate(&mut self, _producer: &mut Producer) -> Result<(), PipelineError> {
                Err(PipelineError::generator("source unavailable"))
            }
        }

        let (tx, _rx) = async_channel::bounded(1);
        let producer = Producer::new(tx, StopHandle::new(), None);

        let report = run_producer(Box::new(Failing), producer, None).await;

        assert!(matches!(report.error, Some(PipelineError::GeneratorError(_))));
    }
}
