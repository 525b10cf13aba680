//! Streaming request bodies fed by a background writer task.

use bytes::Bytes;
use futures::SinkExt;
use futures::channel::mpsc;
use std::future::Future;
use std::io;
use tokio::task::JoinHandle;
use tracing::error;

use crate::error::{Result, TransportError};

/// Write half of a streaming request body.
///
/// Chunks reach the in-flight request in write order. `write` applies
/// backpressure once the pipe's buffered chunks reach its capacity, so a
/// fast writer cannot outrun a slow connection.
pub struct BodyWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl BodyWriter {
    /// Write one chunk to the request body.
    ///
    /// Fails with [`TransportError::PipeClosed`] once the request side has
    /// gone away, for example because the request was aborted.
    pub async fn write(&mut self, chunk: impl Into<Bytes>) -> Result<()> {
        self.tx
            .send(Ok(chunk.into()))
            .await
            .map_err(|_| TransportError::PipeClosed)
    }
}

/// Build a streaming request body whose content is produced by `write` on a
/// background task.
///
/// Returns the body to attach to a request, plus the join handle of the
/// writer task. The body yields exactly the chunks the writer produced, in
/// order, buffering at most `capacity` chunks, so transmission runs in
/// constant memory regardless of the total body size.
///
/// When `write` returns an error, the error is logged, an error item is
/// injected into the pipe so the in-flight request aborts, and the typed
/// value is handed back through the join handle. The task is not cancelled
/// when the request side goes away; it runs until `write` returns or its
/// next write fails with [`TransportError::PipeClosed`].
///
/// Must be called within a Tokio runtime.
pub fn channel_body<E, F, Fut>(
    capacity: usize,
    write: F,
) -> (reqwest::Body, JoinHandle<std::result::Result<(), E>>)
where
    F: FnOnce(BodyWriter) -> Fut + Send + 'static,
    Fut: Future<Output = std::result::Result<(), E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(capacity);

    let handle = tokio::spawn(async move {
        let mut tx = tx;
        let writer = BodyWriter { tx: tx.clone() };
        match write(writer).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(error = %e, "request body writer failed");
                // Abort the in-flight request; the consumer may already be gone.
                let _ = tx.send(Err(io::Error::other(e.to_string()))).await;
                Err(e)
            }
        }
    });

    (reqwest::Body::wrap_stream(rx), handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writer_completes_within_capacity() {
        let (_body, handle) = channel_body::<io::Error, _, _>(4, |mut w| async move {
            w.write(&b"one"[..]).await.map_err(io::Error::other)?;
            w.write(&b"two"[..]).await.map_err(io::Error::other)?;
            Ok(())
        });
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_writer_error_returned_through_handle() {
        let (_body, handle) = channel_body::<io::Error, _, _>(4, |mut w| async move {
            w.write(&b"partial"[..]).await.map_err(io::Error::other)?;
            Err(io::Error::other("encode failed"))
        });
        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "encode failed");
    }

    #[tokio::test]
    async fn test_writer_fails_after_body_dropped() {
        let (body, handle) = channel_body::<io::Error, _, _>(1, |mut w| async move {
            loop {
                w.write(&b"chunk"[..]).await.map_err(io::Error::other)?;
            }
        });
        drop(body);
        assert!(handle.await.unwrap().is_err());
    }
}
