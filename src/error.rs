//! Error types for engine API calls.
//!
//! [`Error`] covers every way a request/response cycle can fail: the transport,
//! the circuit breaker gate, non-2xx responses and malformed payloads.
//! [`DecodeError`] is the narrower error produced while mapping JSON into
//! records and pages.

use crate::models::EngineError;
use http::StatusCode;
use std::time::Duration;

/// The main error type for engine API calls.
///
/// # Examples
///
/// ```no_run
/// use camrest::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .base_url("http://localhost:8080/engine-rest")?
///     .build()?;
///
/// match client.get("task/does-not-exist").await {
///     Ok(response) => println!("Task: {}", response.data),
///     Err(Error::Api { status, error, .. }) => {
///         eprintln!("Engine rejected the call with {}", status);
///         if let Some(error) = error {
///             eprintln!("  {:?}: {:?}", error.kind, error.message);
///         }
///     }
///     Err(Error::CircuitOpen { retry_after }) => {
///         eprintln!("Engine is degraded, try again in {:?}", retry_after);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred before any response was received.
    ///
    /// Always counted as a breaker failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request timed out at the transport layer.
    ///
    /// Counted as a breaker failure like any other transport error.
    #[error("Request timed out")]
    Timeout,

    /// The circuit breaker is open and the recovery window has not elapsed.
    ///
    /// No request was sent and the breaker state was not changed.
    #[error("Circuit breaker is open. Retry after {:.2}s", .retry_after.as_secs_f64())]
    CircuitOpen {
        /// Time left until the breaker lets a trial request through.
        retry_after: Duration,
    },

    /// The engine answered with a non-2xx status.
    ///
    /// `error` is set when the body was an object carrying both `type` and
    /// `message`; `payload` holds any JSON object body.
    #[error("{}", format_api_error(.status, .error))]
    Api {
        /// The HTTP status code
        status: StatusCode,
        /// The structured engine error, when the body had one
        error: Option<Box<EngineError>>,
        /// The JSON object body, when the body was one
        payload: Option<serde_json::Value>,
        /// The raw response body
        raw_response: String,
    },

    /// A JSON payload could not be mapped onto the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A 2xx response body was not valid JSON.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to parse
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// Invalid configuration was provided.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

fn format_api_error(status: &StatusCode, error: &Option<Box<EngineError>>) -> String {
    match error.as_ref().and_then(|e| e.message.as_deref()) {
        Some(message) => format!("Engine API error {}: {}", status.as_u16(), message),
        None => format!("Engine API error {}", status.as_u16()),
    }
}

impl Error {
    /// Returns `true` for failures that happened before a response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout)
    }

    /// Returns `true` if the call was rejected by an open circuit breaker.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Error::CircuitOpen { .. })
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::Api { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the structured engine error, if the response carried one.
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Error::Api { error, .. } => error.as_deref(),
            _ => None,
        }
    }
}

/// Errors raised while mapping JSON onto records and pages.
///
/// Decoding is total for well-formed objects; these only fire for structurally
/// wrong input and are never retried or swallowed.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// An object was required but something else was supplied.
    #[error("expected a JSON object for {context}, found {found}")]
    ExpectedObject {
        /// What was being decoded
        context: String,
        /// The JSON type that was found
        found: &'static str,
    },

    /// A declared field held a value of the wrong type.
    #[error("invalid value for {record}.{field}: {message}")]
    InvalidField {
        /// The record being decoded
        record: &'static str,
        /// The snake_case field name
        field: &'static str,
        /// Why the value was rejected
        message: String,
    },

    /// A value had the wrong JSON type for its target, outside any field context.
    #[error("invalid value: {message}")]
    InvalidValue {
        /// Why the value was rejected
        message: String,
    },

    /// A list envelope was neither an array nor an object, or its item
    /// sequence was not an array.
    #[error("list envelope must be an array or an object, found {found}")]
    InvalidEnvelope {
        /// The JSON type that was found
        found: &'static str,
    },

    /// A list item was not an object.
    #[error("list item {index} must be an object, found {found}")]
    InvalidItem {
        /// Position of the item in the envelope
        index: usize,
        /// The JSON type that was found
        found: &'static str,
    },
}

/// Returns a short name for the JSON type of `value`, for error messages.
pub(crate) fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// A specialized `Result` type for engine API calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message_uses_engine_message() {
        let err = Error::Api {
            status: StatusCode::NOT_FOUND,
            error: Some(Box::new(EngineError {
                kind: Some("InvalidRequestException".to_string()),
                message: Some("No task found".to_string()),
                ..Default::default()
            })),
            payload: None,
            raw_response: String::new(),
        };
        assert_eq!(err.to_string(), "Engine API error 404: No task found");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(
            err.engine_error().and_then(|e| e.kind.as_deref()),
            Some("InvalidRequestException")
        );
    }

    #[test]
    fn test_api_error_message_without_structure() {
        let err = Error::Api {
            status: StatusCode::BAD_GATEWAY,
            error: None,
            payload: None,
            raw_response: "upstream down".to_string(),
        };
        assert_eq!(err.to_string(), "Engine API error 502");
        assert_eq!(err.raw_response(), Some("upstream down"));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_circuit_open_message() {
        let err = Error::CircuitOpen {
            retry_after: Duration::from_millis(1500),
        };
        assert!(err.is_circuit_open());
        assert_eq!(err.to_string(), "Circuit breaker is open. Retry after 1.50s");
        assert_eq!(err.status(), None);
    }
}
