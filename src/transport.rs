//! The dispatcher seam between the client and the network.
//!
//! The client only needs one capability from the network: POST a body to the
//! endpoint and get the response body back, with throttling, refused
//! connections and timeouts told apart. [`Dispatcher`] is that capability and
//! [`ReqwestDispatcher`] is the default implementation.

use crate::error::BoxError;
use crate::proxy::TransportKind;
use crate::{Error, Result};
use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use std::time::Duration;
use url::Url;

/// A transport-level failure reported by a [`Dispatcher`].
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// The endpoint refused the connection.
    #[error("Connection refused")]
    ConnectionRefused,

    /// The exchange did not complete in time.
    #[error("Request timed out")]
    Timeout,

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP status {status}")]
    Status {
        /// The HTTP status code
        status: StatusCode,
        /// The response headers, including `retry-after` on 429
        headers: HeaderMap,
        /// The raw response body
        body: String,
    },

    /// Anything else.
    #[error(transparent)]
    Other(BoxError),
}

/// Performs one POST exchange with the endpoint.
///
/// Implementations are shared by every call made through one client and must
/// not keep per-call state.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Sends `body` to `url` with `headers` and returns the raw response body.
    async fn post(
        &self,
        url: &Url,
        body: String,
        headers: &HeaderMap,
    ) -> std::result::Result<String, TransportError>;
}

/// [`Dispatcher`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestDispatcher {
    http_client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestDispatcher {
    /// Builds a dispatcher for the selected transport.
    ///
    /// A pooled transport ignores proxy environment variables; a proxied one
    /// routes every exchange through the given proxy.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the proxy URL is rejected or the
    /// underlying client cannot be built.
    pub fn new(kind: &TransportKind, timeout: Option<Duration>) -> Result<Self> {
        let builder = match kind {
            TransportKind::Pooled => reqwest::Client::builder().no_proxy(),
            TransportKind::Proxied(proxy_url) => {
                let proxy = reqwest::Proxy::all(proxy_url.as_str())
                    .map_err(|e| Error::ConfigurationError(format!("Invalid proxy: {}", e)))?;
                reqwest::Client::builder().proxy(proxy)
            }
        };

        let http_client = builder.build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            http_client,
            timeout,
        })
    }
}

#[async_trait]
impl Dispatcher for ReqwestDispatcher {
    async fn post(
        &self,
        url: &Url,
        body: String,
        headers: &HeaderMap,
    ) -> std::result::Result<String, TransportError> {
        let mut request = self
            .http_client
            .post(url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .headers(headers.clone())
            .body(body);

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(from_reqwest)?;
        let status = response.status();

        if !status.is_success() {
            let headers = response.headers().clone();
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        status = status.as_u16(),
                        error = %e,
                        "Failed to read error response body"
                    );
                    String::new()
                }
            };
            return Err(TransportError::Status {
                status,
                headers,
                body,
            });
        }

        response.text().await.map_err(from_reqwest)
    }
}

fn from_reqwest(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if is_connection_refused(&err) {
        TransportError::ConnectionRefused
    } else {
        TransportError::Other(Box::new(err))
    }
}

fn is_connection_refused(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = e.source();
    }
    false
}
