//! Client for a document-oriented search engine's REST API.
//!
//! Tideway speaks the engine's classic typed API (`/{index}/{type}/{id}`
//! paths) and focuses on three things:
//! - Streaming bulk ingestion: operations are encoded to NDJSON on a
//!   background task and fed through a bounded pipe, so arbitrarily long
//!   operation sequences upload in constant memory
//! - Offset-based search pagination as a lazy page stream, advancing by
//!   the hits each page actually returned
//! - Index, alias, mapping and single-document administration
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::TryStreamExt;
//! use serde_json::json;
//! use tideway::{BulkOperation, Client, IndexName, TypeName};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("http://localhost:9200")?;
//!     let index = IndexName::new("articles")?;
//!     let doc_type = TypeName::new("article")?;
//!
//!     // Bulk-load documents; the iterator is consumed lazily while the
//!     // request body streams out.
//!     let ops = (0..100_000).map(|n| {
//!         BulkOperation::index(json!({ "n": n, "title": format!("article {n}") }))
//!             .with_id(n as i64)
//!     });
//!     let result = client.bulk_in_typed(&index, &doc_type, ops).await?;
//!     assert!(result.is_success());
//!
//!     client.indices().refresh(&index).await?;
//!
//!     // Page through everything matching a query.
//!     let mut pages = client
//!         .search()
//!         .index(&index)
//!         .query(json!({ "match_all": {} }))
//!         .size(1_000)
//!         .pages();
//!     while let Some(page) = pages.try_next().await? {
//!         println!("{} hits of {}", page.hits().len(), page.total());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bulk;
mod client;
mod error;
mod ids;
mod indices;
mod operation;
mod search;
mod types;

pub use bulk::{BulkItem, BulkItemResult, BulkItemStatus, BulkResult};
pub use client::{Client, WriteResult};
pub use error::{Error, Result};
pub use ids::IdSource;
pub use indices::{IndexSettings, Indices};
pub use operation::{BulkAction, BulkOperation};
pub use search::{Hit, HitsBlock, PageStream, SearchPage, SearchRequest, ShardStats};
pub use types::{DocId, IndexName, TypeName};

pub use tideway_transport::{
    ApiResponse, HttpOptions, OptionsOverride, StatusCode, Transport, TransportError,
};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        BulkOperation, Client, DocId, Error, HttpOptions, IndexName, Result, SearchRequest,
        TypeName,
    };
}
