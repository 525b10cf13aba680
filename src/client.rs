//! Client entry point and single-document operations.

use serde::{Deserialize, Serialize};
use tideway_transport::{HttpOptions, OptionsOverride, Transport};
use tracing::debug;

use crate::bulk::{self, BulkResult};
use crate::error::{Error, Result};
use crate::indices::Indices;
use crate::operation::BulkOperation;
use crate::search::SearchRequest;
use crate::types::{DocId, IndexName, TypeName};

/// Client for a document-oriented search engine.
///
/// Cheap to clone; clones share one connection pool. All state beyond the
/// base URL and options lives on the engine.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
}

impl Client {
    /// Create a client for the engine at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(base_url)?,
        })
    }

    /// Create a client with explicit default options.
    pub fn with_defaults(base_url: impl AsRef<str>, options: HttpOptions) -> Result<Self> {
        Ok(Self {
            transport: Transport::with_options(base_url, options)?,
        })
    }

    /// Derive a client whose defaults have `over` applied.
    ///
    /// The receiver is untouched; requests in flight keep the options they
    /// started with.
    pub fn with_options(&self, over: &OptionsOverride) -> Self {
        Self {
            transport: self.transport.with_override(over),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Default options requests from this client use.
    pub fn options(&self) -> &HttpOptions {
        self.transport.options()
    }

    /// Index and alias administration.
    pub fn indices(&self) -> Indices {
        Indices::new(self.transport.clone())
    }

    /// Start building a search.
    pub fn search(&self) -> SearchRequest {
        SearchRequest::new(self.transport.clone())
    }

    // =========================================================================
    // Bulk Operations
    // =========================================================================

    /// Submit bulk operations to the cluster-wide endpoint.
    ///
    /// Every operation must resolve its own target index, explicitly or
    /// embedded in its source.
    pub async fn bulk<I>(&self, operations: I) -> Result<BulkResult>
    where
        I: IntoIterator<Item = BulkOperation>,
        I::IntoIter: Send + 'static,
    {
        bulk::submit(
            &self.transport,
            vec!["_bulk".to_string()],
            None,
            None,
            operations,
        )
        .await
    }

    /// Submit bulk operations scoped to an index, which becomes the
    /// default target for operations that name none.
    pub async fn bulk_in<I>(&self, index: &IndexName, operations: I) -> Result<BulkResult>
    where
        I: IntoIterator<Item = BulkOperation>,
        I::IntoIter: Send + 'static,
    {
        bulk::submit(
            &self.transport,
            vec![index.as_str().to_string(), "_bulk".to_string()],
            Some(index.clone()),
            None,
            operations,
        )
        .await
    }

    /// Submit bulk operations scoped to an index and mapping type, which
    /// become the default targets for operations that name none.
    pub async fn bulk_in_typed<I>(
        &self,
        index: &IndexName,
        doc_type: &TypeName,
        operations: I,
    ) -> Result<BulkResult>
    where
        I: IntoIterator<Item = BulkOperation>,
        I::IntoIter: Send + 'static,
    {
        bulk::submit(
            &self.transport,
            vec![
                index.as_str().to_string(),
                doc_type.as_str().to_string(),
                "_bulk".to_string(),
            ],
            Some(index.clone()),
            Some(doc_type.clone()),
            operations,
        )
        .await
    }

    // =========================================================================
    // Document Operations
    // =========================================================================

    /// Create a document; the engine rejects an id that already exists.
    /// Without an id the engine assigns one.
    pub async fn doc_create<T: Serialize>(
        &self,
        index: &IndexName,
        doc_type: &TypeName,
        id: Option<&DocId>,
        document: &T,
    ) -> Result<WriteResult> {
        match id {
            Some(id) => debug!("Creating document {}/{}/{}", index, doc_type, id),
            None => debug!("Creating document in {}/{} with generated id", index, doc_type),
        }
        self.write_doc(index, doc_type, id, document, true).await
    }

    /// Index a document, replacing any existing one under the same id.
    /// Without an id the engine assigns one.
    pub async fn doc_index<T: Serialize>(
        &self,
        index: &IndexName,
        doc_type: &TypeName,
        id: Option<&DocId>,
        document: &T,
    ) -> Result<WriteResult> {
        match id {
            Some(id) => debug!("Indexing document {}/{}/{}", index, doc_type, id),
            None => debug!("Indexing document in {}/{} with generated id", index, doc_type),
        }
        self.write_doc(index, doc_type, id, document, false).await
    }

    async fn write_doc<T: Serialize>(
        &self,
        index: &IndexName,
        doc_type: &TypeName,
        id: Option<&DocId>,
        document: &T,
        create_only: bool,
    ) -> Result<WriteResult> {
        let response = match id {
            Some(id) => {
                let id_str = id.to_string();
                let mut segments = vec![index.as_str(), doc_type.as_str(), id_str.as_str()];
                if create_only {
                    segments.push("_create");
                }
                self.transport.put(segments).json(document).send().await?
            }
            None => {
                self.transport
                    .post([index.as_str(), doc_type.as_str()])
                    .json(document)
                    .send()
                    .await?
            }
        };
        Ok(response.decode()?)
    }

    /// Delete a document. A missing document is [`Error::NotFound`];
    /// unlike index deletes, document deletes are not absorbed.
    pub async fn doc_delete(
        &self,
        index: &IndexName,
        doc_type: &TypeName,
        id: &DocId,
    ) -> Result<WriteResult> {
        debug!("Deleting document {}/{}/{}", index, doc_type, id);

        let id_str = id.to_string();
        let response = self
            .transport
            .delete([index.as_str(), doc_type.as_str(), id_str.as_str()])
            .send()
            .await
            .map_err(|e| {
                Error::from(e).map_not_found(|| format!("document {index}/{doc_type}/{id}"))
            })?;
        Ok(response.decode()?)
    }
}

/// Engine acknowledgement of a single-document write or delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResult {
    /// Index the document lives in.
    #[serde(rename = "_index")]
    pub index: String,
    /// Mapping type, when the engine reports one.
    #[serde(rename = "_type")]
    pub doc_type: Option<String>,
    /// Document id, engine-assigned when the request carried none.
    #[serde(rename = "_id")]
    pub id: String,
    /// Document version after the operation.
    #[serde(rename = "_version")]
    pub version: Option<i64>,
    /// Whether a new document was created. Older engines report this flag.
    pub created: Option<bool>,
    /// Whether the document was found, on deletes.
    pub found: Option<bool>,
    /// Operation result label, on engines that report one.
    pub result: Option<String>,
}

impl WriteResult {
    /// True when the operation created a new document.
    pub fn is_created(&self) -> bool {
        self.created == Some(true) || self.result.as_deref() == Some("created")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(Client::new("not a url").is_err());
        assert!(Client::new("mailto:admin@example.com").is_err());
        assert!(Client::new("http://localhost:9200").is_ok());
    }

    #[test]
    fn test_derived_client_leaves_original_untouched() {
        let client = Client::new("http://localhost:9200").unwrap();
        let derived = client.with_options(&OptionsOverride::new().with_content_type("text/plain"));

        assert_eq!(derived.options().content_type, "text/plain");
        assert_eq!(client.options().content_type, "application/json");
    }

    #[test]
    fn test_write_result_created_detection() {
        let old: WriteResult = serde_json::from_value(json!({
            "_index": "logs", "_type": "event", "_id": "1",
            "_version": 1, "created": true
        }))
        .unwrap();
        assert!(old.is_created());

        let newer: WriteResult = serde_json::from_value(json!({
            "_index": "logs", "_id": "1", "_version": 2, "result": "updated"
        }))
        .unwrap();
        assert!(!newer.is_created());
    }
}
