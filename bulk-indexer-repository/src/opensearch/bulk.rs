//! Bulk request bodies and response inspection.

use serde_json::{json, Value};

use crate::errors::StoreError;
use bulk_indexer_shared::Document;

/// Build the action/source line pairs of a bulk index request.
pub(crate) fn bulk_lines(index: &str, documents: &[Document]) -> Vec<Value> {
    let mut lines = Vec::with_capacity(documents.len() * 2);

    for doc in documents {
        lines.push(json!({"index": {"_index": index, "_id": doc.id}}));
        lines.push(doc.payload.clone());
    }

    lines
}

/// Turn a bulk response body into an error when any item failed.
pub(crate) fn check_bulk_response(body: &Value) -> Result<(), StoreError> {
    let has_errors = body
        .get("errors")
        .and_then(|e| e.as_bool())
        .ok_or_else(|| StoreError::parse("Bulk response is missing the `errors` flag"))?;

    if !has_errors {
        return Ok(());
    }

    let items = body.get("items").and_then(|i| i.as_array());
    let failed: Vec<&Value> = items
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object()?.values().next())
                .filter_map(|action| action.get("error"))
                .collect()
        })
        .unwrap_or_default();

    let first_reason = failed
        .first()
        .and_then(|e| e.get("reason"))
        .and_then(|r| r.as_str())
        .unwrap_or("unknown reason");

    Err(StoreError::bulk(format!(
        "{} documents failed, first error: {}",
        failed.len(),
        first_reason
    )))
}
