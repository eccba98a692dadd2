//! Document generator reading newline-delimited JSON.

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use uuid::Uuid;

use crate::IndexingError;
use bulk_indexer_pipeline::{DocumentGenerator, PipelineError, Producer};
use bulk_indexer_shared::Document;

/// Generator pushing one document per non-empty input line.
///
/// Each line must be a JSON object. The document id is taken from the
/// configured id field when present, otherwise a random UUID is used.
/// Lines that do not parse are skipped with a warning.
pub struct NdjsonGenerator<R> {
    reader: R,
    id_field: String,
    skipped: u64,
}

impl NdjsonGenerator<BufReader<File>> {
    /// Open an NDJSON file.
    pub async fn open(
        path: impl AsRef<Path>,
        id_field: impl Into<String>,
    ) -> Result<Self, IndexingError> {
        let file = File::open(path.as_ref()).await?;
        info!(path = %path.as_ref().display(), "Opened input file");
        Ok(Self::from_reader(BufReader::new(file), id_field))
    }
}

impl<R> NdjsonGenerator<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Read documents from any buffered reader.
    pub fn from_reader(reader: R, id_field: impl Into<String>) -> Self {
        Self {
            reader,
            id_field: id_field.into(),
            skipped: 0,
        }
    }

    /// Number of lines skipped because they did not parse.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

/// Parse one input line into a document.
pub fn parse_line(line: &str, id_field: &str) -> Result<Document, String> {
    let payload: Value = serde_json::from_str(line).map_err(|e| e.to_string())?;
    if !payload.is_object() {
        return Err("line is not a JSON object".to_string());
    }

    let id = match payload.get(id_field) {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        Some(other) => return Err(format!("unsupported id value: {}", other)),
        None => Uuid::new_v4().to_string(),
    };

    Ok(Document::new(id, payload))
}

#[async_trait]
impl<R> DocumentGenerator for NdjsonGenerator<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn generate(&mut self, producer: &mut Producer) -> Result<(), PipelineError> {
        let mut lines = (&mut self.reader).lines();
        let mut line_number = 0u64;

        while !producer.should_stop() {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => return Err(PipelineError::generator(e.to_string())),
            };
            line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            match parse_line(&line, &self.id_field) {
                Ok(document) => producer.push(document).await?,
                Err(e) => {
                    warn!(line = line_number, error = %e, "Skipping invalid input line");
                    self.skipped += 1;
                }
            }
        }

        if self.skipped > 0 {
            warn!(skipped = self.skipped, "Some input lines were skipped");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bulk_indexer_pipeline::{RunOutcome, Workgroup, WorkgroupConfig};
    use bulk_indexer_repository::{DocumentStore, IndexCreation, IndexSettings, StoreError};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_parse_line_string_id() {
        let doc = parse_line(r#"{"id": "b-1", "title": "Dune"}"#, "id").unwrap();

        assert_eq!(doc.id, "b-1");
        assert_eq!(doc.payload["title"], "Dune");
    }

    #[test]
    fn test_parse_line_numeric_id() {
        let doc = parse_line(r#"{"isbn": 9780441013593}"#, "isbn").unwrap();
        assert_eq!(doc.id, "9780441013593");
    }

    #[test]
    fn test_parse_line_generated_id() {
        let doc = parse_line(r#"{"title": "Dune"}"#, "id").unwrap();
        assert!(Uuid::parse_str(&doc.id).is_ok());
    }

    #[test]
    fn test_parse_line_rejects_non_objects() {
        assert!(parse_line("[1, 2]", "id").is_err());
        assert!(parse_line("not json", "id").is_err());
        assert!(parse_line(r#"{"id": {"nested": true}}"#, "id").is_err());
    }

    /// Store keeping every submitted document id.
    #[derive(Default)]
    struct RecordingStore {
        ids: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        async fn create_index(&self, _index: &str) -> Result<IndexCreation, StoreError> {
            Ok(IndexCreation::Created)
        }

        async fn apply_settings(
            &self,
            _index: &str,
            _settings: &IndexSettings,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn apply_mapping(
            &self,
            _index: &str,
            _document_type: &str,
            _mapping: &Value,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn submit_bulk(
            &self,
            _index: &str,
            _document_type: &str,
            documents: &[Document],
        ) -> Result<(), StoreError> {
            let mut ids = self.ids.lock().unwrap();
            ids.extend(documents.iter().map(|d| d.id.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_generate_through_workgroup() {
        let input: &'static [u8] = b"{\"id\": \"1\", \"title\": \"Dune\"}\n\
            \n\
            garbage\n\
            {\"id\": \"2\", \"title\": \"Hyperion\"}\n";

        let store = Arc::new(RecordingStore::default());
        let config = WorkgroupConfig::new("books", "_doc")
            .with_consumers(1)
            .with_bulk_size(100);
        let generator = NdjsonGenerator::from_reader(input, "id");
        let mut workgroup = Workgroup::new(config, store.clone(), generator).unwrap();

        let outcome = workgroup.run().await;

        assert!(matches!(outcome, RunOutcome::Completed(_)));
        assert_eq!(*store.ids.lock().unwrap(), vec!["1", "2"]);
    }
}
