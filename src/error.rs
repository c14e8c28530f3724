//! Error types for JSON-RPC calls.
//!
//! Every failure a caller can observe from [`Client::call`](crate::Client::call) or
//! [`Client::call_batch`](crate::Client::call_batch) is one variant of [`Error`].
//! Transport conditions, protocol failures and configuration problems are kept
//! apart so callers can decide what to do with each of them.

use http::{HeaderMap, StatusCode};
use serde_json::{json, Value};

/// Boxed error used for opaque transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Code reported by [`Error::code`] when rate-limit retries are exhausted.
///
/// Matches the "limit exceeded" code used by JSON-RPC nodes.
pub const LIMIT_EXCEEDED_CODE: i64 = -32005;

/// An explicit error object returned by the remote node.
///
/// The code and data are passed through unchanged so callers can interpret
/// server-specific semantics.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("Provider error {code}: {message}")]
pub struct ProviderError {
    /// The numeric error code from the failure response.
    pub code: i64,
    /// The human readable message, empty if the node sent none.
    pub message: String,
    /// Arbitrary diagnostic payload attached by the node.
    pub data: Option<Value>,
}

/// The main error type for JSON-RPC calls.
///
/// # Examples
///
/// ```no_run
/// use rpclink::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .url("https://rpc.example.com")?
///     .build()?;
///
/// match client.call("node_status", vec![]).await {
///     Ok(result) => println!("Status: {}", result),
///     Err(Error::Provider(e)) => eprintln!("Node rejected the call: {} ({:?})", e.code, e.data),
///     Err(Error::LimitExceeded { hostname, retry_after_seconds }) => {
///         eprintln!("{} is throttling us, asked to wait {}s", hostname, retry_after_seconds);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The endpoint refused the connection.
    #[error("Connection refused by {url}")]
    ConnectionRefused {
        /// The endpoint that refused the connection
        url: String,
    },

    /// The request to the endpoint timed out.
    #[error("Request to {url} timed out")]
    NetworkTimeout {
        /// The endpoint that did not answer in time
        url: String,
    },

    /// The endpoint kept rate-limiting the client and retries were exhausted.
    ///
    /// `retry_after_seconds` is the last wait computed before giving up.
    #[error("Rate limit exceeded for {hostname} (retry after {retry_after_seconds}s)")]
    LimitExceeded {
        /// Host of the rate-limiting endpoint
        hostname: String,
        /// The last computed wait in seconds
        retry_after_seconds: u64,
    },

    /// The node answered with an explicit error object.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The endpoint returned a non-2xx status other than 429.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
    },

    /// Any other transport failure, passed through unchanged.
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// The response body could not be decoded as a JSON-RPC response.
    #[error("Failed to decode response: {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to decode
        raw_response: String,
        /// The serde error message
        serde_error: String,
    },

    /// The outgoing call could not be encoded.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// The response did not correlate with the calls that were sent.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid configuration was provided.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid endpoint URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::ConnectionRefused`].
    ConnectionRefused,
    /// See [`Error::NetworkTimeout`].
    NetworkTimeout,
    /// See [`Error::LimitExceeded`].
    LimitExceeded,
    /// See [`Error::Provider`].
    Provider,
    /// HTTP status or opaque transport failures.
    Transport,
    /// Undecodable or uncorrelated responses.
    Protocol,
    /// Construction-time problems.
    Configuration,
}

impl Error {
    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConnectionRefused { .. } => ErrorKind::ConnectionRefused,
            Error::NetworkTimeout { .. } => ErrorKind::NetworkTimeout,
            Error::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            Error::Provider(_) => ErrorKind::Provider,
            Error::HttpError { .. } | Error::Transport(_) => ErrorKind::Transport,
            Error::DeserializationFailed { .. }
            | Error::SerializationFailed(_)
            | Error::UnexpectedResponse(_) => ErrorKind::Protocol,
            Error::ConfigurationError(_) | Error::InvalidUrl(_) => ErrorKind::Configuration,
        }
    }

    /// Returns the numeric error code, if this error carries one.
    ///
    /// Provider errors report the node's code. Rate-limit exhaustion reports
    /// [`LIMIT_EXCEEDED_CODE`].
    ///
    /// # Examples
    ///
    /// ```
    /// use rpclink::{Error, LIMIT_EXCEEDED_CODE};
    ///
    /// let err = Error::LimitExceeded {
    ///     hostname: "rpc.example.com".to_string(),
    ///     retry_after_seconds: 5,
    /// };
    /// assert_eq!(err.code(), Some(LIMIT_EXCEEDED_CODE));
    /// ```
    pub fn code(&self) -> Option<i64> {
        match self {
            Error::Provider(e) => Some(e.code),
            Error::LimitExceeded { .. } => Some(LIMIT_EXCEEDED_CODE),
            _ => None,
        }
    }

    /// Returns the diagnostic payload, if this error carries one.
    ///
    /// Rate-limit exhaustion reports `{ "hostname", "retryAfterSeconds" }`.
    pub fn data(&self) -> Option<Value> {
        match self {
            Error::Provider(e) => e.data.clone(),
            Error::LimitExceeded {
                hostname,
                retry_after_seconds,
            } => Some(json!({
                "hostname": hostname,
                "retryAfterSeconds": retry_after_seconds,
            })),
            _ => None,
        }
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for JSON-RPC calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_exceeded_data() {
        let err = Error::LimitExceeded {
            hostname: "node.example.com".to_string(),
            retry_after_seconds: 5,
        };

        assert_eq!(err.kind(), ErrorKind::LimitExceeded);
        assert_eq!(
            err.data(),
            Some(json!({ "hostname": "node.example.com", "retryAfterSeconds": 5 }))
        );
    }

    #[test]
    fn test_provider_error_passthrough() {
        let err = Error::from(ProviderError {
            code: -32602,
            message: "invalid params".to_string(),
            data: Some(json!({ "index": 1 })),
        });

        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.code(), Some(-32602));
        assert_eq!(err.data(), Some(json!({ "index": 1 })));
        assert_eq!(err.to_string(), "Provider error -32602: invalid params");
    }

    #[test]
    fn test_transport_errors_have_no_code() {
        let err = Error::NetworkTimeout {
            url: "http://localhost:8545/".to_string(),
        };
        assert_eq!(err.code(), None);
        assert_eq!(err.data(), None);
        assert_eq!(err.status(), None);
    }
}
