//! Transport configuration.

use std::time::Duration;

/// Options governing how requests are sent and how responses are surfaced.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Content type sent with request bodies.
    pub content_type: String,
    /// Accept header value.
    pub accept: String,
    /// Per-request timeout, from dispatch until the body is consumed.
    pub timeout: Duration,
    /// Connection timeout, applied when the transport is built.
    pub connect_timeout: Duration,
    /// Carry the full response body inside status errors.
    pub verbose_errors: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            content_type: "application/json".to_string(),
            accept: "application/json".to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            verbose_errors: true,
        }
    }
}

impl HttpOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content type for request bodies.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set the accept header.
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Choose whether status errors carry the response body.
    pub fn with_verbose_errors(mut self, verbose: bool) -> Self {
        self.verbose_errors = verbose;
        self
    }

    /// Merge a per-call override onto these options; set override fields win.
    pub fn merged(&self, over: &OptionsOverride) -> Self {
        let mut merged = self.clone();
        if let Some(content_type) = &over.content_type {
            merged.content_type = content_type.clone();
        }
        if let Some(accept) = &over.accept {
            merged.accept = accept.clone();
        }
        if let Some(timeout) = over.timeout {
            merged.timeout = timeout;
        }
        if let Some(verbose) = over.verbose_errors {
            merged.verbose_errors = verbose;
        }
        merged
    }
}

/// Per-call override for a subset of [`HttpOptions`].
///
/// Unset fields fall through to the transport's defaults. The connection
/// timeout is fixed when the transport is built and cannot be overridden
/// per call.
#[derive(Debug, Clone, Default)]
pub struct OptionsOverride {
    /// Override the request content type.
    pub content_type: Option<String>,
    /// Override the accept header.
    pub accept: Option<String>,
    /// Override the per-request timeout.
    pub timeout: Option<Duration>,
    /// Override whether status errors carry the response body.
    pub verbose_errors: Option<bool>,
}

impl OptionsOverride {
    /// Create an empty override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the request content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Override the accept header.
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override whether status errors carry the response body.
    pub fn with_verbose_errors(mut self, verbose: bool) -> Self {
        self.verbose_errors = Some(verbose);
        self
    }

    /// Check whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.content_type.is_none()
            && self.accept.is_none()
            && self.timeout.is_none()
            && self.verbose_errors.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = HttpOptions::default();
        assert_eq!(options.content_type, "application/json");
        assert_eq!(options.accept, "application/json");
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.connect_timeout, Duration::from_secs(10));
        assert!(options.verbose_errors);
    }

    #[test]
    fn test_empty_override_changes_nothing() {
        let options = HttpOptions::default().with_timeout(Duration::from_secs(5));
        let merged = options.merged(&OptionsOverride::new());
        assert_eq!(merged.timeout, Duration::from_secs(5));
        assert_eq!(merged.content_type, options.content_type);
        assert!(OptionsOverride::new().is_empty());
    }

    #[test]
    fn test_override_wins_field_wise() {
        let options = HttpOptions::default();
        let over = OptionsOverride::new()
            .with_content_type("application/x-ndjson")
            .with_verbose_errors(false);
        let merged = options.merged(&over);
        assert_eq!(merged.content_type, "application/x-ndjson");
        assert!(!merged.verbose_errors);
        // unset fields fall through
        assert_eq!(merged.accept, "application/json");
        assert_eq!(merged.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_setters() {
        let options = HttpOptions::new()
            .with_accept("application/yaml")
            .with_connect_timeout(Duration::from_secs(2));
        assert_eq!(options.accept, "application/yaml");
        assert_eq!(options.connect_timeout, Duration::from_secs(2));
    }
}
