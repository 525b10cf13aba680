//! Search requests, paginated result streaming and response models.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tideway_transport::Transport;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{IndexName, TypeName};

const DEFAULT_PAGE_SIZE: u64 = 10_000;

/// Builder for a search call.
///
/// Scope the request with [`index`](Self::index) and
/// [`doc_type`](Self::doc_type), attach a raw query clause, then execute
/// with [`once`](Self::once) for a single page, [`pages`](Self::pages) for
/// a lazy page stream, or [`count`](Self::count) for the total alone.
#[derive(Clone)]
pub struct SearchRequest {
    transport: Transport,
    index: Option<IndexName>,
    doc_type: Option<TypeName>,
    query: Option<Value>,
    from: u64,
    size: u64,
    fields: Vec<String>,
}

impl SearchRequest {
    pub(crate) fn new(transport: Transport) -> Self {
        Self {
            transport,
            index: None,
            doc_type: None,
            query: None,
            from: 0,
            size: DEFAULT_PAGE_SIZE,
            fields: Vec::new(),
        }
    }

    /// Restrict the search to one index.
    pub fn index(mut self, index: &IndexName) -> Self {
        self.index = Some(index.clone());
        self
    }

    /// Restrict the search to one mapping type. Requires an index.
    pub fn doc_type(mut self, doc_type: &TypeName) -> Self {
        self.doc_type = Some(doc_type.clone());
        self
    }

    /// Raw query clause, sent as the body's `query` member.
    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    /// Initial result offset.
    pub fn from(mut self, from: u64) -> Self {
        self.from = from;
        self
    }

    /// Page window: how many hits each request may return.
    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Return only the named fields per hit instead of the full source.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Execute a single request and return its page.
    pub async fn once(self) -> Result<SearchPage> {
        let state = self.into_state()?;
        fetch_page(&state).await
    }

    /// Execute as a lazy stream of pages.
    ///
    /// Each page costs exactly one request. The offset advances by the
    /// number of hits a page actually returned, so short pages do not skip
    /// documents. The first page with zero hits terminates the stream and
    /// is not yielded; a search with no matches yields no pages at all.
    pub fn pages(self) -> PageStream {
        let init = self.into_state();
        let inner = stream::try_unfold(init, |state| async move {
            let mut state = state?;
            let page = fetch_page(&state).await?;
            let returned = page.hits.hits.len() as u64;
            if returned == 0 {
                return Ok(None);
            }
            state.offset += returned;
            Ok(Some((page, Ok(state))))
        });
        PageStream {
            inner: inner.boxed(),
        }
    }

    /// Execute in count mode and return only the total hit count.
    pub async fn count(self) -> Result<u64> {
        let state = self.into_state()?;
        let response = state
            .transport
            .post(state.segments)
            .query("search_type", "count")
            .json(&state.body)
            .send()
            .await?;
        let page: SearchPage = response.decode()?;
        debug!("Count query matched {} documents", page.hits.total);
        Ok(page.hits.total)
    }

    fn into_state(self) -> Result<PageState> {
        let segments = match (&self.index, &self.doc_type) {
            (Some(index), Some(doc_type)) => vec![
                index.as_str().to_string(),
                doc_type.as_str().to_string(),
                "_search".to_string(),
            ],
            (Some(index), None) => vec![index.as_str().to_string(), "_search".to_string()],
            (None, None) => vec!["_search".to_string()],
            (None, Some(_)) => {
                return Err(Error::Validation(
                    "a mapping type requires an index".to_string(),
                ));
            }
        };
        let body = match self.query {
            Some(query) => json!({ "query": query }),
            None => json!({}),
        };
        let fields_param = if self.fields.is_empty() {
            None
        } else {
            Some(self.fields.join(","))
        };
        Ok(PageState {
            transport: self.transport,
            segments,
            body,
            offset: self.from,
            size: self.size,
            fields_param,
        })
    }
}

#[derive(Debug)]
struct PageState {
    transport: Transport,
    segments: Vec<String>,
    body: Value,
    offset: u64,
    size: u64,
    fields_param: Option<String>,
}

async fn fetch_page(state: &PageState) -> Result<SearchPage> {
    debug!(
        "Searching /{} (from={}, size={})",
        state.segments.join("/"),
        state.offset,
        state.size
    );
    let mut request = state
        .transport
        .post(state.segments.clone())
        .query("from", state.offset.to_string())
        .query("size", state.size.to_string());
    if let Some(fields) = &state.fields_param {
        request = request.query("fields", fields);
    }
    let response = request.json(&state.body).send().await?;
    Ok(response.decode()?)
}

/// Lazy, forward-only stream of search pages.
///
/// Backed by at most one in-flight request; dropping the stream stops
/// pagination. Obtained from [`SearchRequest::pages`].
pub struct PageStream {
    inner: BoxStream<'static, Result<SearchPage>>,
}

impl Stream for PageStream {
    type Item = Result<SearchPage>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for PageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageStream").finish_non_exhaustive()
    }
}

/// One page of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    /// Time taken in milliseconds.
    pub took: u64,
    /// Whether the search timed out.
    #[serde(default)]
    pub timed_out: bool,
    /// Shard participation tally.
    #[serde(rename = "_shards")]
    pub shards: ShardStats,
    /// The hits block.
    pub hits: HitsBlock,
}

impl SearchPage {
    /// Hits on this page.
    pub fn hits(&self) -> &[Hit] {
        &self.hits.hits
    }

    /// Total hits matching the query across all pages.
    pub fn total(&self) -> u64 {
        self.hits.total
    }

    /// True when this page carries no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.hits.is_empty()
    }
}

/// Shard participation in a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardStats {
    /// Shards the search targeted.
    pub total: u32,
    /// Shards that answered.
    pub successful: u32,
    /// Shards that failed.
    pub failed: u32,
}

/// Hits block of a search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitsBlock {
    /// Total matching documents.
    pub total: u64,
    /// Highest score on this page.
    pub max_score: Option<f64>,
    /// Hit records.
    pub hits: Vec<Hit>,
}

/// A single hit: a document projection plus its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    /// Index the document lives in.
    #[serde(rename = "_index")]
    pub index: String,
    /// Mapping type, when the engine reports one.
    #[serde(rename = "_type")]
    pub doc_type: Option<String>,
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Relevance score; absent when scoring is disabled.
    #[serde(rename = "_score")]
    pub score: Option<f64>,
    /// Full document source, unless a field projection was requested.
    #[serde(rename = "_source")]
    pub source: Option<Value>,
    /// Projected fields, when the search asked for specific fields.
    pub fields: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> Transport {
        Transport::new("http://localhost:9200").unwrap()
    }

    #[test]
    fn test_search_response_deserializes() {
        let body = json!({
            "took": 3,
            "timed_out": false,
            "_shards": {"total": 5, "successful": 5, "failed": 0},
            "hits": {
                "total": 17,
                "max_score": 1.0,
                "hits": [
                    {"_index": "logs", "_type": "event", "_id": "a",
                     "_score": 1.0, "_source": {"level": "warn"}},
                    {"_index": "logs", "_type": "event", "_id": "b",
                     "_score": 0.4, "fields": {"level": ["info"]}}
                ]
            }
        });

        let page: SearchPage = serde_json::from_value(body).unwrap();
        assert_eq!(page.total(), 17);
        assert_eq!(page.hits().len(), 2);
        assert!(!page.is_empty());
        assert_eq!(page.hits()[0].id, "a");
        assert_eq!(page.hits()[0].source, Some(json!({"level": "warn"})));
        assert_eq!(page.hits()[1].source, None);
        assert_eq!(page.hits()[1].fields, Some(json!({"level": ["info"]})));
    }

    #[test]
    fn test_scope_segments() {
        let logs = IndexName::new("logs").unwrap();
        let event = TypeName::new("event").unwrap();

        let state = SearchRequest::new(transport()).into_state().unwrap();
        assert_eq!(state.segments, vec!["_search"]);

        let state = SearchRequest::new(transport())
            .index(&logs)
            .into_state()
            .unwrap();
        assert_eq!(state.segments, vec!["logs", "_search"]);

        let state = SearchRequest::new(transport())
            .index(&logs)
            .doc_type(&event)
            .into_state()
            .unwrap();
        assert_eq!(state.segments, vec!["logs", "event", "_search"]);
    }

    #[test]
    fn test_type_without_index_is_rejected() {
        let event = TypeName::new("event").unwrap();
        let err = SearchRequest::new(transport())
            .doc_type(&event)
            .into_state()
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_body_wraps_query_clause() {
        let state = SearchRequest::new(transport())
            .query(json!({"term": {"level": "warn"}}))
            .into_state()
            .unwrap();
        assert_eq!(state.body, json!({"query": {"term": {"level": "warn"}}}));

        let state = SearchRequest::new(transport()).into_state().unwrap();
        assert_eq!(state.body, json!({}));
    }

    #[test]
    fn test_fields_are_comma_joined() {
        let state = SearchRequest::new(transport())
            .fields(["title", "level"])
            .into_state()
            .unwrap();
        assert_eq!(state.fields_param.as_deref(), Some("title,level"));

        let state = SearchRequest::new(transport()).into_state().unwrap();
        assert_eq!(state.fields_param, None);
    }
}
