//! Mock store shared by the pipeline tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::cancellation::StopHandle;
use bulk_indexer_repository::{DocumentStore, IndexCreation, IndexSettings, StoreError};
use bulk_indexer_shared::Document;

pub(crate) fn documents(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| Document::new(i.to_string(), json!({"value": format!("toto-{}", i)})))
        .collect()
}

#[derive(Clone, Copy, PartialEq)]
enum CreateBehaviour {
    Create,
    AlreadyExists,
    Fail,
}

/// Store that records every call and fails on demand.
pub(crate) struct MockStore {
    create: CreateBehaviour,
    fail_serving_settings: bool,
    bulk_failures_left: AtomicUsize,
    bulk_calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
    operations: Mutex<Vec<String>>,
    stop_on_create: Mutex<Option<StopHandle>>,
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self {
            create: CreateBehaviour::Create,
            fail_serving_settings: false,
            bulk_failures_left: AtomicUsize::new(0),
            bulk_calls: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
            operations: Mutex::new(Vec::new()),
            stop_on_create: Mutex::new(None),
        }
    }

    /// Fail the next `times` bulk submissions; `usize::MAX` fails forever.
    pub(crate) fn failing_bulk(self, times: usize) -> Self {
        self.bulk_failures_left.store(times, Ordering::SeqCst);
        self
    }

    pub(crate) fn with_existing_index(mut self) -> Self {
        self.create = CreateBehaviour::AlreadyExists;
        self
    }

    pub(crate) fn failing_create(mut self) -> Self {
        self.create = CreateBehaviour::Fail;
        self
    }

    pub(crate) fn failing_serving_settings(mut self) -> Self {
        self.fail_serving_settings = true;
        self
    }

    /// Raise `stop` while the index is being created.
    pub(crate) fn stop_on_create(&self, stop: StopHandle) {
        *self.stop_on_create.lock().unwrap() = Some(stop);
    }

    pub(crate) fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    pub(crate) fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    fn record(&self, operation: impl Into<String>) {
        self.operations.lock().unwrap().push(operation.into());
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn create_index(&self, _index: &str) -> Result<IndexCreation, StoreError> {
        self.record("create");
        if let Some(stop) = self.stop_on_create.lock().unwrap().as_ref() {
            stop.request_stop();
        }
        match self.create {
            CreateBehaviour::Create => Ok(IndexCreation::Created),
            CreateBehaviour::AlreadyExists => Ok(IndexCreation::AlreadyExists),
            CreateBehaviour::Fail => Err(StoreError::index_creation("cluster unavailable")),
        }
    }

    async fn apply_settings(
        &self,
        _index: &str,
        settings: &IndexSettings,
    ) -> Result<(), StoreError> {
        self.record(format!("settings:{}", settings.number_of_replicas));
        if self.fail_serving_settings && settings.number_of_replicas > 0 {
            return Err(StoreError::settings("settings rejected"));
        }
        Ok(())
    }

    async fn apply_mapping(
        &self,
        _index: &str,
        document_type: &str,
        _mapping: &Value,
    ) -> Result<(), StoreError> {
        self.record(format!("mapping:{}", document_type));
        Ok(())
    }

    async fn submit_bulk(
        &self,
        _index: &str,
        _document_type: &str,
        documents: &[Document],
    ) -> Result<(), StoreError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);

        let left = self.bulk_failures_left.load(Ordering::SeqCst);
        if left > 0 {
            if left != usize::MAX {
                self.bulk_failures_left.fetch_sub(1, Ordering::SeqCst);
            }
            return Err(StoreError::bulk("503 Service Unavailable"));
        }

        self.batch_sizes.lock().unwrap().push(documents.len());
        Ok(())
    }
}
