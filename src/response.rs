//! Response wrapper that keeps the decoded data next to the raw exchange.

use crate::error::DecodeError;
use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// A response from the engine.
///
/// `data` is the parsed JSON body (`null` for an empty body) or, for the typed
/// client helpers, the record or page decoded from it.
///
/// # Examples
///
/// ```no_run
/// use camrest::Client;
/// use camrest::models::Task;
///
/// # async fn example() -> Result<(), camrest::Error> {
/// let client = Client::builder()
///     .base_url("http://localhost:8080/engine-rest")?
///     .build()?;
///
/// let task = client.get_record::<Task>("task/abc", None).await?;
/// println!("Task: {:?}", task.data.name);
/// println!("Request took {:?}", task.latency);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response data.
    pub data: T,

    /// The raw response body as a string.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from sending the request until the body was read.
    pub latency: Duration,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
        }
    }

    /// Maps the response data to a different type, keeping the metadata.
    ///
    /// # Examples
    ///
    /// ```
    /// # use camrest::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     42,
    ///     "42".to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    /// );
    ///
    /// let string_response = response.map(|n| n.to_string());
    /// assert_eq!(string_response.data, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
        }
    }

    /// Decodes the response data, keeping the metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `f` rejects the data.
    pub fn try_map<U, F>(self, f: F) -> Result<Response<U>>
    where
        F: FnOnce(&T) -> std::result::Result<U, DecodeError>,
    {
        match f(&self.data) {
            Ok(data) => Ok(Response {
                data,
                raw_body: self.raw_body,
                status: self.status,
                headers: self.headers,
                latency: self.latency,
            }),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    status = self.status.as_u16(),
                    raw_response = %self.raw_body,
                    "Failed to decode response"
                );
                Err(Error::Decode(e))
            }
        }
    }

    /// Returns a reference to a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl Response<Value> {
    /// Turns a non-2xx response into [`Error::Api`].
    ///
    /// Useful after a call made with
    /// [`allow_error`](crate::metadata::RequestMetadata::allow_error) once the
    /// caller has handled the statuses it expects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for any non-2xx status.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(crate::client::api_error(self.status, self.raw_body))
        }
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
