//! Workgroup orchestrating a bulk load.
//!
//! A run goes through these stages:
//!
//! 1. Optional startup hook; `false` fails the run before touching the store
//! 2. Provisioning: create the index, apply the mapping, apply
//!    write-optimized settings
//! 3. Running: one producer task and `num_consumers` consumer tasks share a
//!    bounded channel
//! 4. Draining: once the producer is done the channel is closed and the
//!    consumers flush what is left
//! 5. Restoring: serving settings are put back, unless the run was stopped
//!    or failed
//!
//! The stop flag is checked before every provisioning step and at the
//! producer and consumer check points.

mod outcome;
mod probe;

pub use outcome::{RunOutcome, RunStats};
pub use probe::{StopProbe, DEFAULT_PROBE_INTERVAL};

use chrono::Utc;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

use crate::cancellation::StopHandle;
use crate::config::{read_mapping_file, WorkgroupConfig};
use crate::consumer::{BatchConsumer, ConsumerExit, ConsumerReport, PushCallback};
use crate::errors::PipelineError;
use crate::producer::{run_producer, DocumentGenerator, ProduceCallback, Producer, ProducerReport};
use bulk_indexer_repository::{DocumentStore, IndexCreation, IndexSettings, StoreError};
use probe::ProbeGuard;

/// Hook run before provisioning; returning `false` aborts the run.
pub type StartupHook = Box<dyn FnMut() -> bool + Send>;

/// Hook run once when a run fails.
pub type FailureHook = Box<dyn FnMut(&PipelineError) + Send>;

/// Hook run once when a run completes or is cancelled, with the cancelled flag.
pub type FinishHook = Box<dyn FnMut(bool) + Send>;

/// Whether provisioning got the index ready.
enum Provisioning {
    Ready,
    Cancelled,
}

/// What the producer and consumers achieved.
struct LoadReport {
    produced: u64,
    indexed: u64,
    batches: u64,
    failure: Option<PipelineError>,
}

/// Orchestrator for one bulk load into one index.
pub struct Workgroup {
    config: WorkgroupConfig,
    store: Arc<dyn DocumentStore>,
    generator: Option<Box<dyn DocumentGenerator>>,
    stop: StopHandle,
    stop_probe: Option<(StopProbe, Duration)>,
    on_produce: Option<ProduceCallback>,
    on_production_finished: Option<ProduceCallback>,
    on_push: Option<PushCallback>,
    on_startup: Option<StartupHook>,
    on_failure: Option<FailureHook>,
    on_finish: Option<FinishHook>,
}

impl Workgroup {
    /// Create a new workgroup.
    ///
    /// # Returns
    ///
    /// * `Ok(Workgroup)` - Ready to run
    /// * `Err(PipelineError::ConfigError)` - If the configuration is invalid
    pub fn new(
        config: WorkgroupConfig,
        store: Arc<dyn DocumentStore>,
        generator: impl DocumentGenerator + 'static,
    ) -> Result<Self, PipelineError> {
        if let Err(e) = config.validate() {
            error!(error = %e, "Invalid workgroup configuration");
            return Err(e);
        }

        Ok(Self {
            config,
            store,
            generator: Some(Box::new(generator)),
            stop: StopHandle::new(),
            stop_probe: None,
            on_produce: None,
            on_production_finished: None,
            on_push: None,
            on_startup: None,
            on_failure: None,
            on_finish: None,
        })
    }

    /// Called with the running count after every pushed document.
    pub fn set_on_produce_callback(&mut self, callback: impl Fn(u64) + Send + Sync + 'static) {
        self.on_produce = Some(Arc::new(callback));
    }

    /// Called once with the final count when the generator returns.
    pub fn set_on_production_finished_callback(
        &mut self,
        callback: impl Fn(u64) + Send + Sync + 'static,
    ) {
        self.on_production_finished = Some(Arc::new(callback));
    }

    /// Called with the batch size after every successful bulk write.
    ///
    /// Consumers run concurrently, so the callback may be invoked from
    /// several tasks at once.
    pub fn set_on_push_callback(&mut self, callback: impl Fn(usize) + Send + Sync + 'static) {
        self.on_push = Some(Arc::new(callback));
    }

    pub fn set_startup_callback(&mut self, callback: impl FnMut() -> bool + Send + 'static) {
        self.on_startup = Some(Box::new(callback));
    }

    pub fn set_failure_callback(
        &mut self,
        callback: impl FnMut(&PipelineError) + Send + 'static,
    ) {
        self.on_failure = Some(Box::new(callback));
    }

    pub fn set_finish_callback(&mut self, callback: impl FnMut(bool) + Send + 'static) {
        self.on_finish = Some(Box::new(callback));
    }

    /// Poll `probe` every `interval` while running; `true` requests a stop.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The probe is registered
    /// * `Err(PipelineError::ConfigError)` - If `interval` is zero
    pub fn set_stop_probe(
        &mut self,
        probe: impl Fn() -> bool + Send + Sync + 'static,
        interval: Duration,
    ) -> Result<(), PipelineError> {
        if interval.is_zero() {
            return Err(PipelineError::config("stop probe interval must be > 0"));
        }
        self.stop_probe = Some((Arc::new(probe), interval));
        Ok(())
    }

    /// Set the field mapping applied after index creation.
    pub fn set_mapping(&mut self, mapping: Value) {
        self.config.mapping = Some(mapping);
    }

    /// Read the field mapping from a JSON file.
    pub fn set_mapping_file(&mut self, path: impl AsRef<Path>) -> Result<(), PipelineError> {
        self.config.mapping = Some(read_mapping_file(path.as_ref())?);
        Ok(())
    }

    /// Set whether an index creation failure aborts the run.
    pub fn set_fail_on_duplicate_index(&mut self, fail: bool) {
        self.config.fail_on_duplicate_index = fail;
    }

    pub fn index_name(&self) -> &str {
        &self.config.index_name
    }

    /// Raise the stop flag. Calling it again is a no-op.
    pub fn request_stop(&self) {
        if self.stop.request_stop() {
            info!(index = %self.config.index_name, "Stop requested");
        }
    }

    pub fn should_stop(&self) -> bool {
        self.stop.should_stop()
    }

    /// Handle for stopping the workgroup from another task while it runs.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run the bulk load.
    ///
    /// A workgroup runs once; later calls fail with
    /// `PipelineError::AlreadyRan`.
    #[instrument(skip(self), fields(index = %self.config.index_name))]
    pub async fn run(&mut self) -> RunOutcome {
        let generator = match self.generator.take() {
            Some(generator) => generator,
            None => return self.fail(PipelineError::AlreadyRan),
        };

        // Polling stops when the guard is dropped, on every return path.
        let _probe = self
            .stop_probe
            .as_ref()
            .map(|(probe, interval)| ProbeGuard::spawn(probe.clone(), *interval, self.stop.clone()));

        let started_at = Utc::now();
        let start = Instant::now();

        if let Some(hook) = self.on_startup.as_mut() {
            if !hook() {
                return self.fail(PipelineError::StartupRejected);
            }
        }

        match self.provision().await {
            Ok(Provisioning::Ready) => {}
            Ok(Provisioning::Cancelled) => {
                return self.cancelled(RunStats::empty(started_at, start.elapsed()));
            }
            Err(e) => return self.fail(e),
        }

        let load = self.load(generator).await;
        let stats = RunStats {
            produced: load.produced,
            indexed: load.indexed,
            batches: load.batches,
            started_at,
            elapsed: start.elapsed(),
        };

        if let Some(e) = load.failure {
            return self.fail(e);
        }

        if self.stop.should_stop() {
            return self.cancelled(stats);
        }

        if let Err(e) = self
            .store
            .apply_settings(&self.config.index_name, &IndexSettings::serving_optimized())
            .await
        {
            return self.fail(PipelineError::RestoreError(e));
        }

        if let Some(hook) = self.on_finish.as_mut() {
            hook(false);
        }

        let stats = RunStats {
            elapsed: start.elapsed(),
            ..stats
        };
        info!(
            indexed = stats.indexed,
            batches = stats.batches,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            docs_per_sec = stats.throughput(),
            bulk_size = self.config.bulk_size,
            "Bulk load finished"
        );

        RunOutcome::Completed(stats)
    }

    /// Create the index and switch it to write-optimized settings.
    async fn provision(&self) -> Result<Provisioning, PipelineError> {
        let index = self.config.index_name.as_str();

        if self.stop.should_stop() {
            return Ok(Provisioning::Cancelled);
        }
        match self.store.create_index(index).await {
            Ok(IndexCreation::Created) => info!(index = %index, "Index created"),
            Ok(IndexCreation::AlreadyExists) if self.config.fail_on_duplicate_index => {
                return Err(StoreError::index_creation(format!(
                    "index '{}' already exists",
                    index
                ))
                .into());
            }
            Ok(IndexCreation::AlreadyExists) => {
                warn!(index = %index, "Index already exists, loading into it");
            }
            Err(e) if self.config.fail_on_duplicate_index => return Err(e.into()),
            Err(e) => {
                warn!(index = %index, error = %e, "Unable to create index, continuing");
            }
        }

        if let Some(mapping) = &self.config.mapping {
            if self.stop.should_stop() {
                return Ok(Provisioning::Cancelled);
            }
            self.store
                .apply_mapping(index, &self.config.document_type, mapping)
                .await?;
        }

        if self.stop.should_stop() {
            return Ok(Provisioning::Cancelled);
        }
        self.store
            .apply_settings(index, &IndexSettings::write_optimized())
            .await?;

        Ok(Provisioning::Ready)
    }

    /// Run the producer and consumers until everything is drained.
    async fn load(&self, generator: Box<dyn DocumentGenerator>) -> LoadReport {
        let (sender, receiver) = async_channel::bounded(self.config.channel_buffer_size.max(1));

        let producer = Producer::new(sender.clone(), self.stop.clone(), self.on_produce.clone());
        let producer_handle = tokio::spawn(run_producer(
            generator,
            producer,
            self.on_production_finished.clone(),
        ));

        let consumer_handles: Vec<_> = (0..self.config.num_consumers)
            .map(|id| {
                let consumer = BatchConsumer::new(
                    id,
                    self.store.clone(),
                    self.config.index_name.clone(),
                    self.config.document_type.clone(),
                    self.config.bulk_size,
                    self.stop.clone(),
                    self.on_push.clone(),
                );
                tokio::spawn(consumer.consume(receiver.clone()))
            })
            .collect();
        // Only consumers hold receivers, so a producer outliving them is
        // released instead of blocking on a full channel.
        drop(receiver);

        info!(
            consumers = self.config.num_consumers,
            bulk_size = self.config.bulk_size,
            "Loading documents"
        );

        let production = producer_handle.await.unwrap_or_else(|e| ProducerReport {
            produced: 0,
            error: Some(PipelineError::task(format!("producer task failed: {}", e))),
        });

        // Production has ended; consumers drain what is left.
        sender.close();

        let mut report = LoadReport {
            produced: production.produced,
            indexed: 0,
            batches: 0,
            failure: production.error,
        };

        for result in futures::future::join_all(consumer_handles).await {
            let consumer = result.unwrap_or_else(|e| ConsumerReport {
                documents: 0,
                batches: 0,
                exit: ConsumerExit::Failed(PipelineError::task(format!(
                    "consumer task failed: {}",
                    e
                ))),
            });

            report.indexed += consumer.documents;
            report.batches += consumer.batches;
            if let ConsumerExit::Failed(e) = consumer.exit {
                // Submission failures come first: they are the root cause of
                // any producer error that followed.
                if !matches!(report.failure, Some(PipelineError::SubmissionError { .. })) {
                    report.failure = Some(e);
                }
            }
        }

        report
    }

    fn fail(&mut self, error: PipelineError) -> RunOutcome {
        error!(index = %self.config.index_name, error = %error, "Bulk load failed");
        if let Some(hook) = self.on_failure.as_mut() {
            hook(&error);
        }
        RunOutcome::Failed(error)
    }

    fn cancelled(&mut self, stats: RunStats) -> RunOutcome {
        warn!(
            index = %self.config.index_name,
            indexed = stats.indexed,
            "Bulk load cancelled, index settings left as they are"
        );
        if let Some(hook) = self.on_finish.as_mut() {
            hook(true);
        }
        RunOutcome::Cancelled(stats)
    }
}
