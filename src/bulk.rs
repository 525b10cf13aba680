//! Streaming NDJSON bulk submission and response models.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tideway_transport::{OptionsOverride, Transport, channel_body};
use tracing::debug;

use crate::error::{Error, Result};
use crate::operation::{BulkAction, BulkOperation};
use crate::types::{IndexName, TypeName};

/// Content type the engine requires for bulk bodies.
const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Chunks in flight between the encoder task and the request body.
const BULK_PIPE_CAPACITY: usize = 64;

/// Encode `operations` as NDJSON and post them to the bulk endpoint at
/// `segments`.
///
/// Encoding runs on a background task and feeds the request body through a
/// bounded pipe, so the operation sequence is consumed one element at a
/// time and never materialized. Operations already written when a later one
/// fails to encode have been transmitted; the engine reports per-operation
/// outcomes independently and so does the returned [`BulkResult`].
pub(crate) async fn submit<I>(
    transport: &Transport,
    segments: Vec<String>,
    default_index: Option<IndexName>,
    default_type: Option<TypeName>,
    operations: I,
) -> Result<BulkResult>
where
    I: IntoIterator<Item = BulkOperation>,
    I::IntoIter: Send + 'static,
{
    let operations = operations.into_iter();
    let (body, writer) = channel_body(BULK_PIPE_CAPACITY, move |mut sink| async move {
        for (position, operation) in operations.enumerate() {
            let lines = operation
                .resolve(default_index.as_ref(), default_type.as_ref())
                .map_err(|reason| Error::Encoding {
                    op: position,
                    reason,
                })?;
            sink.write(encode_line(&lines.header)?).await?;
            if let Some(source) = lines.source {
                sink.write(encode_line(&source)?).await?;
            }
        }
        Ok::<(), Error>(())
    });

    let sent = transport
        .post(segments)
        .options(OptionsOverride::new().with_content_type(NDJSON_CONTENT_TYPE))
        .body_stream(body)
        .send()
        .await;

    // The writer's own failure is the root cause unless it only saw the
    // pipe close, which means the transport side gave up first.
    match writer.await {
        Err(join) => return Err(Error::BulkWriter(join.to_string())),
        Ok(Err(e)) if !e.is_pipe_closed() => return Err(e),
        Ok(_) => {}
    }

    let response = sent?;
    let result: BulkResult = response.decode()?;
    debug!(
        "Bulk response: {} items, errors={}",
        result.items.len(),
        result.errors
    );
    Ok(result)
}

/// One JSON document rendered onto a single line with a trailing newline.
fn encode_line(value: &Value) -> Result<Vec<u8>> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    Ok(line)
}

/// Parsed bulk response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkResult {
    /// Time taken in milliseconds.
    pub took: u64,
    /// Whether any item failed.
    pub errors: bool,
    /// Per-operation outcomes, in submission order.
    pub items: Vec<BulkItem>,
}

impl BulkResult {
    /// True when every item succeeded.
    pub fn is_success(&self) -> bool {
        !self.errors
    }

    /// Item statuses in submission order.
    pub fn statuses(&self) -> impl Iterator<Item = &BulkItemStatus> {
        self.items.iter().map(BulkItem::status)
    }
}

/// Outcome of a single bulk operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItem {
    /// Outcome keyed by the operation's action.
    #[serde(flatten)]
    pub result: BulkItemResult,
}

impl BulkItem {
    /// Action this item reports on.
    pub fn action(&self) -> BulkAction {
        match self.result {
            BulkItemResult::Index(_) => BulkAction::Index,
            BulkItemResult::Create(_) => BulkAction::Create,
            BulkItemResult::Update(_) => BulkAction::Update,
            BulkItemResult::Delete(_) => BulkAction::Delete,
        }
    }

    /// Status record regardless of action.
    pub fn status(&self) -> &BulkItemStatus {
        match &self.result {
            BulkItemResult::Index(s)
            | BulkItemResult::Create(s)
            | BulkItemResult::Update(s)
            | BulkItemResult::Delete(s) => s,
        }
    }
}

/// Bulk item outcome, keyed by action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkItemResult {
    /// Index outcome.
    Index(BulkItemStatus),
    /// Create outcome.
    Create(BulkItemStatus),
    /// Update outcome.
    Update(BulkItemStatus),
    /// Delete outcome.
    Delete(BulkItemStatus),
}

/// Target identity and result of one bulk operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemStatus {
    /// Index the operation targeted.
    #[serde(rename = "_index")]
    pub index: String,
    /// Mapping type, when the engine reports one.
    #[serde(rename = "_type")]
    pub doc_type: Option<String>,
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Document version after the operation.
    #[serde(rename = "_version")]
    pub version: Option<i64>,
    /// HTTP-style status for this item. Older engines omit it.
    pub status: Option<u16>,
    /// Operation result label, on engines that report one.
    pub result: Option<String>,
    /// Error details for failed items; a string on older engines, an
    /// object on newer ones.
    pub error: Option<Value>,
}

impl BulkItemStatus {
    /// True when the item succeeded.
    pub fn is_success(&self) -> bool {
        match self.status {
            Some(status) => (200..300).contains(&status),
            None => self.error.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_line_terminates_with_newline() {
        let line = encode_line(&json!({"a": 1})).unwrap();
        assert_eq!(line, b"{\"a\":1}\n");
    }

    #[test]
    fn test_bulk_response_deserializes() {
        let body = json!({
            "took": 12,
            "errors": true,
            "items": [
                {"create": {"_index": "logs", "_type": "event", "_id": "1",
                            "_version": 1, "status": 201}},
                {"index": {"_index": "logs", "_type": "event", "_id": "2",
                           "status": 409,
                           "error": "DocumentAlreadyExistsException[[logs][2]]"}},
                {"delete": {"_index": "logs", "_type": "event", "_id": "3",
                            "_version": 2, "status": 200}}
            ]
        });

        let result: BulkResult = serde_json::from_value(body).unwrap();
        assert_eq!(result.took, 12);
        assert!(!result.is_success());
        assert_eq!(result.items.len(), 3);

        let actions: Vec<_> = result.items.iter().map(BulkItem::action).collect();
        assert_eq!(
            actions,
            vec![BulkAction::Create, BulkAction::Index, BulkAction::Delete]
        );

        let ok: Vec<_> = result.statuses().map(BulkItemStatus::is_success).collect();
        assert_eq!(ok, vec![true, false, true]);
        assert_eq!(result.items[1].status().id, "2");
    }

    #[test]
    fn test_item_without_status_falls_back_to_error_presence() {
        let ok: BulkItemStatus = serde_json::from_value(json!({
            "_index": "logs", "_id": "1", "_version": 1
        }))
        .unwrap();
        assert!(ok.is_success());

        let failed: BulkItemStatus = serde_json::from_value(json!({
            "_index": "logs", "_id": "1", "error": "MapperParsingException[boom]"
        }))
        .unwrap();
        assert!(!failed.is_success());
    }
}
