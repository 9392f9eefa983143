//! Request execution against the engine REST API.
//!
//! The [`Client`] type is the main entry point. Every call serializes
//! parameters and bodies with the configured [`Serializer`], builds its URL,
//! passes the circuit breaker gate, and reports the outcome back to the
//! breaker before any status handling happens. Use [`ClientBuilder`] to configure and create
//! clients.

use crate::breaker::{CircuitBreaker, CircuitBreakerConfig, Clock, SharedClock, SystemClock};
use crate::error::{json_type, DecodeError};
use crate::models::EngineError;
use crate::record::{normalize_keys, Record};
use crate::wire::{query_pairs, IntoWire, Serializer, SnakeToCamel};
use crate::{metadata::RequestMetadata, Error, Page, Response, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// A borrowed outbound value: query parameters or a request body.
pub type WireArg<'a> = &'a (dyn IntoWire + Sync);

/// A client for the engine REST API.
///
/// The client is cheap to clone. Clones share the connection pool and the
/// circuit breaker, so failures seen through any clone count towards the same
/// threshold.
///
/// # Examples
///
/// ```no_run
/// use camrest::Client;
/// use camrest::models::{Task, TaskQuery};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), camrest::Error> {
/// let client = Client::builder()
///     .base_url("http://localhost:8080/engine-rest")?
///     .timeout(Duration::from_secs(30))
///     .build()?;
///
/// let query = TaskQuery {
///     assignee: Some("demo".to_string()),
///     max_results: Some(10),
///     ..Default::default()
/// };
/// let tasks = client.get_page::<Task>("task", Some(&query)).await?;
/// for task in &tasks.data {
///     println!("{:?}: {:?}", task.id, task.name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: Url,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    serializer: Box<dyn Serializer>,
    breaker: Option<CircuitBreaker<SharedClock>>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camrest::Client;
    ///
    /// # async fn example() -> Result<(), camrest::Error> {
    /// let client = Client::builder()
    ///     .base_url("http://localhost:8080/engine-rest")?
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Returns the base URL. It always ends with `/`.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Returns the shared circuit breaker, if one is configured.
    pub fn circuit_breaker(&self) -> Option<&CircuitBreaker<SharedClock>> {
        self.inner.breaker.as_ref()
    }

    /// Executes one request.
    ///
    /// `params` and `body` go through the client's serializer; parameters are
    /// then flattened into query pairs and the body is sent as JSON.
    ///
    /// Transport failures and 5xx responses are recorded as breaker failures,
    /// every other response as a success. Non-2xx responses then fail with
    /// [`Error::Api`] unless `metadata.allow_error` is set.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if the path does not resolve against the base URL
    ///   (checked before the breaker gate, so breaker state is untouched)
    /// - [`Error::CircuitOpen`] if the breaker rejects the call (nothing is sent)
    /// - [`Error::Timeout`] or [`Error::Network`] for transport failures
    /// - [`Error::Api`] for non-2xx responses
    /// - [`Error::DeserializationFailed`] for a 2xx body that is not JSON
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camrest::{Client, metadata::RequestMetadata};
    /// use http::Method;
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), camrest::Error> {
    /// let client = Client::builder()
    ///     .base_url("http://localhost:8080/engine-rest")?
    ///     .build()?;
    ///
    /// let metadata = RequestMetadata::new(Method::GET, "task/abc").allow_error();
    /// let response = client.send(metadata, None, None).await?;
    /// if response.status == http::StatusCode::NOT_FOUND {
    ///     println!("No such task");
    /// }
    ///
    /// let body = json!({"variables": {}, "with_variables_in_return": true});
    /// let metadata = RequestMetadata::new(Method::POST, "task/abc/complete");
    /// client.send(metadata, None, Some(&body)).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send(
        &self,
        metadata: RequestMetadata,
        params: Option<WireArg<'_>>,
        body: Option<WireArg<'_>>,
    ) -> Result<Response<Value>> {
        let mut pairs = params
            .map(|params| query_pairs(&self.inner.serializer.serialize(params)))
            .unwrap_or_default();
        pairs.extend(metadata.query_params.iter().cloned());
        let url = self.build_url(&metadata.path, &pairs)?;
        let json_body = body.map(|body| self.inner.serializer.serialize(body));

        if let Some(breaker) = &self.inner.breaker {
            if let Err(e) = breaker.before_call() {
                tracing::warn!(
                    method = %metadata.method,
                    path = %metadata.path,
                    error = %e,
                    "Request rejected by circuit breaker"
                );
                return Err(e);
            }
        }

        tracing::debug!(
            method = %metadata.method,
            url = %url,
            "Executing HTTP request"
        );

        let mut request = self.inner.http_client.request(metadata.method.clone(), url);
        for (name, value) in &self.inner.default_headers {
            request = request.header(name, value);
        }
        for (name, value) in &metadata.headers {
            request = request.header(name, value);
        }
        if let Some(timeout) = metadata.timeout.or(self.inner.timeout) {
            request = request.timeout(timeout);
        }
        if let Some(json) = &json_body {
            request = request.json(json);
        }

        let start_time = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                self.record_failure();
                tracing::warn!(
                    error = %e,
                    method = %metadata.method,
                    path = %metadata.path,
                    "Transport failure"
                );
                return Err(transport_error(e));
            }
        };

        let status = response.status();
        if status.is_server_error() {
            self.record_failure();
        } else {
            self.record_success();
        }

        let headers = response.headers().clone();
        let raw_body = response.text().await.map_err(transport_error)?;
        let latency = start_time.elapsed();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "Received HTTP response"
        );

        if !status.is_success() {
            if status.is_client_error() {
                tracing::error!(
                    status = status.as_u16(),
                    response = %raw_body,
                    "Client error (4xx)"
                );
            } else if status.is_server_error() {
                tracing::warn!(
                    status = status.as_u16(),
                    response = %raw_body,
                    "Server error (5xx)"
                );
            }

            if !metadata.allow_error {
                return Err(api_error(status, raw_body));
            }
        }

        let data = if raw_body.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&raw_body) {
                Ok(data) => data,
                // Error bodies let through by `allow_error` are often plain text.
                Err(_) if !status.is_success() => Value::Null,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        raw_response = %raw_body,
                        "Failed to deserialize response"
                    );
                    return Err(Error::DeserializationFailed {
                        raw_response: raw_body,
                        serde_error: e.to_string(),
                        status,
                    });
                }
            }
        };

        Ok(Response::new(data, raw_body, status, headers, latency))
    }

    /// Makes a GET request to the specified path.
    pub async fn get(&self, path: impl Into<String>) -> Result<Response<Value>> {
        self.send(RequestMetadata::new(Method::GET, path), None, None)
            .await
    }

    /// Makes a GET request with query parameters.
    pub async fn get_with(
        &self,
        path: impl Into<String>,
        params: WireArg<'_>,
    ) -> Result<Response<Value>> {
        self.send(RequestMetadata::new(Method::GET, path), Some(params), None)
            .await
    }

    /// Makes a POST request to the specified path with a JSON body.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camrest::Client;
    /// use camrest::models::TaskCompletionRequest;
    ///
    /// # async fn example() -> Result<(), camrest::Error> {
    /// let client = Client::builder()
    ///     .base_url("http://localhost:8080/engine-rest")?
    ///     .build()?;
    ///
    /// let request = TaskCompletionRequest {
    ///     with_variables_in_return: Some(true),
    ///     ..Default::default()
    /// };
    /// let response = client.post("task/abc/complete", &request).await?;
    /// println!("Variables: {}", response.data);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn post(&self, path: impl Into<String>, body: WireArg<'_>) -> Result<Response<Value>> {
        self.send(RequestMetadata::new(Method::POST, path), None, Some(body))
            .await
    }

    /// Makes a PUT request to the specified path with a JSON body.
    pub async fn put(&self, path: impl Into<String>, body: WireArg<'_>) -> Result<Response<Value>> {
        self.send(RequestMetadata::new(Method::PUT, path), None, Some(body))
            .await
    }

    /// Makes a PATCH request to the specified path with a JSON body.
    pub async fn patch(
        &self,
        path: impl Into<String>,
        body: WireArg<'_>,
    ) -> Result<Response<Value>> {
        self.send(RequestMetadata::new(Method::PATCH, path), None, Some(body))
            .await
    }

    /// Makes a DELETE request to the specified path.
    pub async fn delete(&self, path: impl Into<String>) -> Result<Response<Value>> {
        self.send(RequestMetadata::new(Method::DELETE, path), None, None)
            .await
    }

    /// GETs a single record.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`send`](Self::send), returns [`Error::Decode`]
    /// if the body is not an object of the record's shape.
    pub async fn get_record<R: Record>(
        &self,
        path: impl Into<String>,
        params: Option<WireArg<'_>>,
    ) -> Result<Response<R>> {
        let response = self
            .send(RequestMetadata::new(Method::GET, path), params, None)
            .await?;
        response.try_map(R::decode)
    }

    /// GETs a paginated listing.
    ///
    /// Accepts both a bare JSON array and the `items`/`data` envelope forms.
    pub async fn get_page<R: Record>(
        &self,
        path: impl Into<String>,
        params: Option<WireArg<'_>>,
    ) -> Result<Response<Page<R>>> {
        let response = self
            .send(RequestMetadata::new(Method::GET, path), params, None)
            .await?;
        response.try_map(Page::decode)
    }

    /// GETs an object of records keyed by name, such as a variable listing.
    pub async fn get_map<R: Record>(
        &self,
        path: impl Into<String>,
        params: Option<WireArg<'_>>,
    ) -> Result<Response<BTreeMap<String, R>>> {
        let response = self
            .send(RequestMetadata::new(Method::GET, path), params, None)
            .await?;
        response.try_map(decode_record_map)
    }

    fn build_url(&self, path: &str, pairs: &[(String, String)]) -> Result<Url> {
        let mut url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn record_failure(&self) {
        if let Some(breaker) = &self.inner.breaker {
            breaker.record_failure();
        }
    }

    fn record_success(&self) {
        if let Some(breaker) = &self.inner.breaker {
            breaker.record_success();
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .field("breaker", &self.inner.breaker)
            .finish()
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Network(e)
    }
}

/// Builds [`Error::Api`] from a non-2xx response body.
///
/// The body becomes the payload when it is a JSON object. It is decoded as an
/// [`EngineError`] only when its normalized keys include both `type` and
/// `message`.
pub(crate) fn api_error(status: StatusCode, raw_response: String) -> Error {
    let (payload, error) = match serde_json::from_str::<Value>(&raw_response) {
        Ok(Value::Object(map)) => {
            let normalized = normalize_keys(&map);
            let error = if normalized.contains_key("type") && normalized.contains_key("message") {
                EngineError::decode_map(&map).ok().map(Box::new)
            } else {
                None
            };
            (Some(Value::Object(map)), error)
        }
        _ => (None, None),
    };

    Error::Api {
        status,
        error,
        payload,
        raw_response,
    }
}

fn decode_record_map<R: Record>(
    value: &Value,
) -> std::result::Result<BTreeMap<String, R>, DecodeError> {
    let Value::Object(map) = value else {
        return Err(DecodeError::ExpectedObject {
            context: format!("map of {}", R::NAME),
            found: json_type(value),
        });
    };
    map.iter()
        .map(|(name, item)| Ok((name.clone(), R::decode(item)?)))
        .collect()
}

/// Serializable client settings, for loading from a configuration file.
///
/// A missing `circuit_breaker` key uses the default breaker; an explicit
/// `null` disables it.
///
/// # Examples
///
/// ```
/// use camrest::{ClientBuilder, ClientConfig};
///
/// let config: ClientConfig = serde_json::from_str(r#"{
///     "base_url": "http://localhost:8080/engine-rest",
///     "timeout_secs": 10,
///     "circuit_breaker": {"failure_threshold": 3, "recovery_timeout": 15}
/// }"#).unwrap();
/// let client = ClientBuilder::from_config(&config)?.build()?;
/// assert_eq!(client.base_url().as_str(), "http://localhost:8080/engine-rest/");
/// # Ok::<(), camrest::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root URL of the engine REST API.
    pub base_url: String,

    /// Request timeout in seconds. No timeout when absent.
    #[serde(default)]
    pub timeout_secs: Option<f64>,

    /// Headers sent with every request.
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,

    /// Circuit breaker settings.
    #[serde(default = "default_breaker")]
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

fn default_breaker() -> Option<CircuitBreakerConfig> {
    Some(CircuitBreakerConfig::default())
}

/// Builder for configuring and creating a [`Client`].
///
/// A circuit breaker with [`CircuitBreakerConfig::default`] is enabled unless
/// [`without_circuit_breaker`](Self::without_circuit_breaker) is called.
///
/// # Examples
///
/// ```no_run
/// use camrest::{ClientBuilder, CircuitBreakerConfig};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), camrest::Error> {
/// let client = ClientBuilder::new()
///     .base_url("http://localhost:8080/engine-rest")?
///     .timeout(Duration::from_secs(30))
///     .circuit_breaker(CircuitBreakerConfig::default().with_failure_threshold(3))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    serializer: Box<dyn Serializer>,
    breaker_config: Option<CircuitBreakerConfig>,
    clock: SharedClock,
    http_client: Option<reqwest::Client>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            timeout: None,
            serializer: Box::new(SnakeToCamel),
            breaker_config: Some(CircuitBreakerConfig::default()),
            clock: Arc::new(SystemClock),
            http_client: None,
        }
    }

    /// Creates a builder from serialized settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL, a header or the timeout is invalid.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = Self::new().base_url(&config.base_url)?;
        for (name, value) in &config.default_headers {
            builder = builder.default_header(name, value)?;
        }
        if let Some(secs) = config.timeout_secs {
            let timeout = Duration::try_from_secs_f64(secs).map_err(|e| {
                Error::ConfigurationError(format!("Invalid timeout_secs {}: {}", secs, e))
            })?;
            builder = builder.timeout(timeout);
        }
        builder.breaker_config = config.circuit_breaker;
        Ok(builder)
    }

    /// Sets the base URL for all requests.
    ///
    /// A trailing `/` is added if missing, so request paths always resolve
    /// below it.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = format!("{}/", url.as_ref().trim_end_matches('/'));
        self.base_url = Some(Url::parse(&url)?);
        Ok(self)
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the default [`SnakeToCamel`] serializer.
    pub fn serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Box::new(serializer);
        self
    }

    /// Sets the circuit breaker configuration.
    pub fn circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.breaker_config = Some(config);
        self
    }

    /// Disables the circuit breaker.
    pub fn without_circuit_breaker(mut self) -> Self {
        self.breaker_config = None;
        self
    }

    /// Sets the clock the circuit breaker reads time from.
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Uses a pre-configured `reqwest` client as the transport.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided, the breaker configuration
    /// is invalid or the HTTP client cannot be built.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigurationError("Base URL is required".to_string()))?;

        let breaker = self
            .breaker_config
            .map(|config| CircuitBreaker::with_clock(config, self.clock))
            .transpose()?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder().build().map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?,
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                default_headers: self.default_headers,
                timeout: self.timeout,
                serializer: self.serializer,
                breaker,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
