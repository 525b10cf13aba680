//! HTTP transport for the search engine REST API.

use http::{Method, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Result, TransportError};
use crate::options::{HttpOptions, OptionsOverride};
use crate::response::ApiResponse;

/// HTTP transport speaking to one engine node.
///
/// Cheap to clone; clones share the connection pool and default options.
#[derive(Debug, Clone)]
pub struct Transport {
    inner: reqwest::Client,
    base: Url,
    options: Arc<HttpOptions>,
}

impl Transport {
    /// Create a transport for the given base URL with default options.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_options(base_url, HttpOptions::default())
    }

    /// Create a transport with explicit options.
    ///
    /// The base URL is validated here, before any request is issued. A path
    /// on the base URL is kept as a prefix for every request.
    pub fn with_options(base_url: impl AsRef<str>, options: HttpOptions) -> Result<Self> {
        let base = Url::parse(base_url.as_ref())?;
        if base.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(format!("not a base URL: {base}")));
        }

        let inner = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.timeout)
            .build()?;

        Ok(Self {
            inner,
            base,
            options: Arc::new(options),
        })
    }

    /// Base URL requests are issued against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Default options for this transport.
    pub fn options(&self) -> &HttpOptions {
        &self.options
    }

    /// Derive a transport whose defaults have `over` merged in.
    ///
    /// The connection pool is shared with `self` and `self` keeps its own
    /// defaults untouched. The connection timeout cannot change after the
    /// pool is built.
    pub fn with_override(&self, over: &OptionsOverride) -> Self {
        Self {
            inner: self.inner.clone(),
            base: self.base.clone(),
            options: Arc::new(self.options.merged(over)),
        }
    }

    /// Start a HEAD request for the given path segments.
    pub fn head<I, S>(&self, segments: I) -> RequestBuilder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request(Method::HEAD, segments)
    }

    /// Start a GET request for the given path segments.
    pub fn get<I, S>(&self, segments: I) -> RequestBuilder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request(Method::GET, segments)
    }

    /// Start a POST request for the given path segments.
    pub fn post<I, S>(&self, segments: I) -> RequestBuilder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request(Method::POST, segments)
    }

    /// Start a PUT request for the given path segments.
    pub fn put<I, S>(&self, segments: I) -> RequestBuilder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request(Method::PUT, segments)
    }

    /// Start a DELETE request for the given path segments.
    pub fn delete<I, S>(&self, segments: I) -> RequestBuilder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request(Method::DELETE, segments)
    }

    /// Start a request with an arbitrary method.
    pub fn request<I, S>(&self, method: Method, segments: I) -> RequestBuilder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RequestBuilder::new(self, method, segments.into_iter().map(Into::into).collect())
    }
}

enum RequestBody {
    None,
    Bytes(Vec<u8>),
    Stream(reqwest::Body),
}

/// Request builder carrying path segments, query parameters, and body.
pub struct RequestBuilder<'a> {
    transport: &'a Transport,
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: RequestBody,
    over: OptionsOverride,
    encode_error: Option<serde_json::Error>,
}

impl<'a> RequestBuilder<'a> {
    fn new(transport: &'a Transport, method: Method, segments: Vec<String>) -> Self {
        Self {
            transport,
            method,
            segments,
            query: Vec::new(),
            body: RequestBody::None,
            over: OptionsOverride::default(),
            encode_error: None,
        }
    }

    /// Append one path segment.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a JSON body.
    ///
    /// A serialization failure is reported when the request is sent.
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        match serde_json::to_vec(body) {
            Ok(bytes) => self.body = RequestBody::Bytes(bytes),
            Err(e) => self.encode_error = Some(e),
        }
        self
    }

    /// Set a streaming body, typically from [`crate::channel_body`].
    pub fn body_stream(mut self, body: reqwest::Body) -> Self {
        self.body = RequestBody::Stream(body);
        self
    }

    /// Override transport options for this request only.
    pub fn options(mut self, over: OptionsOverride) -> Self {
        self.over = over;
        self
    }

    /// Build the request URL: base, then percent-encoded path segments,
    /// then query parameters. A `/` inside a segment is encoded, never a
    /// path separator.
    fn build_url(&self) -> Result<Url> {
        let mut url = self.transport.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| TransportError::InvalidUrl(format!("cannot-be-a-base URL: {}", self.transport.base)))?;
            path.pop_if_empty();
            path.extend(self.segments.iter());
        }
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Send the request and classify the response.
    ///
    /// 200 and 201 succeed, with the body decoded as JSON when possible.
    /// Every other status becomes [`TransportError::Status`] carrying the
    /// response.
    pub async fn send(mut self) -> Result<ApiResponse> {
        if let Some(e) = self.encode_error.take() {
            return Err(TransportError::Encode(e));
        }

        let options = self.transport.options.merged(&self.over);
        let url = self.build_url()?;
        trace!(method = %self.method, url = %url, "dispatching request");

        let mut request = self
            .transport
            .inner
            .request(self.method, url.clone())
            .header(http::header::ACCEPT, &options.accept)
            .timeout(options.timeout);

        request = match self.body {
            RequestBody::None => request,
            RequestBody::Bytes(bytes) => request
                .header(http::header::CONTENT_TYPE, &options.content_type)
                .body(bytes),
            RequestBody::Stream(body) => request
                .header(http::header::CONTENT_TYPE, &options.content_type)
                .body(body),
        };

        let response = request.send().await?;
        let status = response.status();
        let response = ApiResponse::read(response).await?;

        match status {
            StatusCode::OK | StatusCode::CREATED => Ok(response),
            status => {
                debug!(status = %status, url = %url, "request returned error status");
                Err(status_error(status, &url, response, options.verbose_errors))
            }
        }
    }

    /// Send an existence check: 200 is `true`, 404 is `false`.
    ///
    /// Any other status is a [`TransportError::Status`]. Meant for HEAD
    /// requests, whose responses carry no body.
    pub async fn exists(self) -> Result<bool> {
        let options = self.transport.options.merged(&self.over);
        let url = self.build_url()?;
        trace!(method = %self.method, url = %url, "dispatching existence check");

        let response = self
            .transport
            .inner
            .request(self.method, url.clone())
            .timeout(options.timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let response = ApiResponse::read(response).await?;
                Err(status_error(status, &url, response, options.verbose_errors))
            }
        }
    }
}

fn status_error(status: StatusCode, url: &Url, response: ApiResponse, verbose: bool) -> TransportError {
    let response = if verbose {
        response
    } else {
        ApiResponse::empty(status)
    };
    TransportError::Status {
        status,
        url: url.to_string(),
        response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            Transport::new("not a url"),
            Err(TransportError::UrlParse(_))
        ));
        assert!(matches!(
            Transport::new("mailto:node@example.com"),
            Err(TransportError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_build_url_percent_encodes_segments() {
        let transport = Transport::new("http://localhost:9200").unwrap();
        let url = transport
            .get(["odd index", "a/b", "_search"])
            .build_url()
            .unwrap();
        assert_eq!(url.path(), "/odd%20index/a%2Fb/_search");
    }

    #[test]
    fn test_build_url_keeps_base_path_prefix() {
        let transport = Transport::new("http://localhost:9200/es").unwrap();
        let url = transport.put(["idx"]).build_url().unwrap();
        assert_eq!(url.path(), "/es/idx");
    }

    #[test]
    fn test_build_url_appends_query_parameters() {
        let transport = Transport::new("http://localhost:9200").unwrap();
        let url = transport
            .post(["idx", "_search"])
            .query("from", "0")
            .query("size", "10")
            .build_url()
            .unwrap();
        assert_eq!(url.query(), Some("from=0&size=10"));
    }

    #[test]
    fn test_with_override_derives_new_defaults() {
        let transport = Transport::new("http://localhost:9200").unwrap();
        let derived = transport.with_override(
            &OptionsOverride::new().with_content_type("application/x-ndjson"),
        );
        assert_eq!(derived.options().content_type, "application/x-ndjson");
        assert_eq!(transport.options().content_type, "application/json");
    }
}
