//! # Tideway Transport
//!
//! Minimal HTTP transport for Elasticsearch-compatible REST APIs: verb
//! helpers addressed by percent-encoded path segments, uniform response
//! classification, and streaming request bodies fed by a background writer
//! task.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tideway_transport::Transport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Transport::new("http://localhost:9200")?;
//!
//!     let response = transport.get(["articles", "_settings"]).send().await?;
//!     println!("status: {}", response.status());
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming bodies
//!
//! ```rust,no_run
//! use tideway_transport::{channel_body, Transport, TransportError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Transport::new("http://localhost:9200")?;
//!
//!     let (body, writer) = channel_body::<TransportError, _, _>(16, |mut w| async move {
//!         for n in 0..1000 {
//!             w.write(format!("{{\"n\":{n}}}\n")).await?;
//!         }
//!         Ok(())
//!     });
//!
//!     let sent = transport.post(["ingest"]).body_stream(body).send().await;
//!     writer.await??;
//!     sent?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod body;
mod error;
mod options;
mod response;
mod transport;

pub use body::{BodyWriter, channel_body};
pub use error::{Result, TransportError};
pub use options::{HttpOptions, OptionsOverride};
pub use response::ApiResponse;
pub use transport::{RequestBuilder, Transport};

// Re-export common types
pub use bytes::Bytes;
pub use http::{Method, StatusCode};
pub use url::Url;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::body::{BodyWriter, channel_body};
    pub use crate::error::{Result, TransportError};
    pub use crate::options::{HttpOptions, OptionsOverride};
    pub use crate::response::ApiResponse;
    pub use crate::transport::{RequestBuilder, Transport};
    pub use http::{Method, StatusCode};
}
