//! Engine response wrapper.

use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::borrow::Cow;

/// Response from the engine.
///
/// Carries the status, the raw body, and the body decoded as JSON when it
/// parses. A body that fails to decode is kept raw rather than reported as
/// an error, so unusual engine output is still inspectable.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Bytes,
    json: Option<Value>,
}

impl ApiResponse {
    pub(crate) async fn read(response: reqwest::Response) -> crate::Result<Self> {
        let status = response.status();
        let body = response.bytes().await?;
        let json = serde_json::from_slice(&body).ok();
        Ok(Self { status, body, json })
    }

    /// Response with the body withheld, used when errors are not verbose.
    pub(crate) fn empty(status: StatusCode) -> Self {
        Self {
            status,
            body: Bytes::new(),
            json: None,
        }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Check whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decoded JSON body, when the body parsed as JSON.
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Raw response body.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Response body as text, lossy for non-UTF-8 bodies.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserialize the raw body into a typed model.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}
