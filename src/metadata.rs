//! Per-request settings.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::time::Duration;

/// Metadata for an individual engine request.
///
/// Holds the method, the path relative to the client's base URL and anything
/// that varies per call. Typed query parameters and bodies are passed to
/// [`Client::send`](crate::Client::send) separately so they go through the
/// client's serializer.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// The request path, relative to the base URL.
    pub path: String,

    /// Additional headers for this request.
    pub headers: HeaderMap,

    /// Extra query pairs, sent verbatim after the serialized parameters.
    pub query_params: Vec<(String, String)>,

    /// Overrides the client timeout for this request.
    pub timeout: Option<Duration>,

    /// When `true`, non-2xx responses are returned instead of raised as
    /// [`Error::Api`](crate::Error::Api). The breaker is updated either way.
    pub allow_error: bool,
}

impl RequestMetadata {
    /// Creates a new `RequestMetadata` with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query_params: Vec::new(),
            timeout: None,
            allow_error: false,
        }
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, crate::Error> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds a raw query pair to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Sets a timeout for this request only.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns non-2xx responses to the caller instead of failing.
    pub fn allow_error(mut self) -> Self {
        self.allow_error = true;
        self
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new(Method::GET, "")
    }
}
