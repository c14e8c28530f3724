//! JSON-RPC client with id correlation, batch reordering and rate-limit retries.
//!
//! The [`Client`] type is the main entry point for making calls.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    batch,
    classify::{classify_failure, classify_transport, Classification},
    codec::{self, Call, FailureResponse, Payload, RpcResponse},
    observer::RequestObserver,
    proxy::{select_transport, ProxyConfig},
    retry::RetryPolicy,
    transport::{Dispatcher, ReqwestDispatcher},
    Error, Result,
};
use http::header::USER_AGENT;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A JSON-RPC client bound to one endpoint.
///
/// The client is designed to be reused and shared. Clones share the id
/// counter and the transport, so ids stay unique across all of them.
///
/// # Examples
///
/// ```no_run
/// use rpclink::Client;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), rpclink::Error> {
/// let client = Client::builder()
///     .url("https://rpc.example.com")?
///     .header("x-api-key", "secret")?
///     .build()?;
///
/// let height = client.call("chain_height", vec![]).await?;
/// println!("Height: {}", height);
///
/// let results = client
///     .call_batch(vec![
///         ("chain_block", vec![json!(1)]),
///         ("chain_block", vec![json!(2)]),
///     ])
///     .await?;
/// assert_eq!(results.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    url: Url,
    headers: HeaderMap,
    dispatcher: Arc<dyn Dispatcher>,
    retry_policy: RetryPolicy,
    observer: Option<Arc<dyn RequestObserver>>,
    next_id: AtomicU64,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Returns the endpoint this client talks to.
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Calls `method` with `params` and returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] if the node answers with an error object,
    /// [`Error::LimitExceeded`] if rate-limit retries are exhausted, and the
    /// classified transport error for any other failed exchange.
    pub async fn call(&self, method: impl Into<String>, params: Vec<Value>) -> Result<Value> {
        let call = Call::new(self.reserve_ids(1), method, params);
        let body = codec::encode(&call)?;

        match self.send(std::slice::from_ref(&call), body).await? {
            Payload::Single(RpcResponse::Success(response)) if response.id == call.id => {
                Ok(response.result)
            }
            Payload::Single(RpcResponse::Success(response)) => Err(Error::UnexpectedResponse(
                format!("expected reply for id {}, got id {}", call.id, response.id),
            )),
            Payload::Single(RpcResponse::Failure(failure)) => Err(self.fail(failure)),
            Payload::Batch(responses) => Err(Error::UnexpectedResponse(format!(
                "expected a single reply for id {}, got a batch of {}",
                call.id,
                responses.len()
            ))),
        }
    }

    /// Sends all calls in one exchange and returns their results in input order.
    ///
    /// Ids are assigned consecutively in input order. If any reply is an
    /// error object the whole batch fails with the error of the lowest id;
    /// results of the other calls are discarded.
    pub async fn call_batch<I, M>(&self, calls: I) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = (M, Vec<Value>)>,
        M: Into<String>,
    {
        let requests: Vec<(M, Vec<Value>)> = calls.into_iter().collect();
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let first_id = self.reserve_ids(requests.len() as u64);
        let calls: Vec<Call> = requests
            .into_iter()
            .zip(first_id..)
            .map(|((method, params), id)| Call::new(id, method, params))
            .collect();

        let body = codec::encode(&calls)?;
        let responses = match self.send(&calls, body).await? {
            Payload::Batch(responses) => responses,
            Payload::Single(RpcResponse::Failure(failure)) => return Err(self.fail(failure)),
            Payload::Single(RpcResponse::Success(response)) => {
                return Err(Error::UnexpectedResponse(format!(
                    "expected a batch of {} replies, got a single reply for id {}",
                    calls.len(),
                    response.id
                )))
            }
        };

        let (successes, failures): (Vec<_>, Vec<_>) =
            responses.into_iter().partition(|r| !r.is_failure());

        let first_failure = failures
            .into_iter()
            .filter_map(|r| match r {
                RpcResponse::Failure(failure) => Some(failure),
                RpcResponse::Success(_) => None,
            })
            .min_by_key(|failure| failure.id.unwrap_or(u64::MAX));
        if let Some(failure) = first_failure {
            return Err(self.fail(failure));
        }

        let successes = successes
            .into_iter()
            .filter_map(|r| match r {
                RpcResponse::Success(response) => Some(response),
                RpcResponse::Failure(_) => None,
            })
            .collect();

        let ids: Vec<u64> = calls.iter().map(|call| call.id).collect();
        let ordered = batch::restore_order(successes, &ids)?;

        Ok(ordered.into_iter().map(|response| response.result).collect())
    }

    /// Reserves `count` consecutive ids and returns the first.
    fn reserve_ids(&self, count: u64) -> u64 {
        self.inner.next_id.fetch_add(count, Ordering::SeqCst)
    }

    /// Exchanges the encoded `calls` with the endpoint, retrying while it rate-limits us.
    async fn send(&self, calls: &[Call], body: String) -> Result<Payload> {
        if let Some(observer) = &self.inner.observer {
            observer.on_request(calls);
        }

        let mut retry_count = 0;

        loop {
            tracing::debug!(
                url = %self.inner.url,
                first_id = calls.first().map(|c| c.id),
                calls = calls.len(),
                retry_count = retry_count,
                "Dispatching JSON-RPC request"
            );

            let err = match self
                .inner
                .dispatcher
                .post(&self.inner.url, body.clone(), &self.inner.headers)
                .await
            {
                Ok(raw_body) => {
                    if let Some(observer) = &self.inner.observer {
                        observer.on_response(calls, &raw_body);
                    }
                    return codec::parse_response(&raw_body);
                }
                Err(err) => err,
            };

            let signal = match classify_transport(err, &self.inner.url) {
                Classification::RateLimited(signal) => signal,
                Classification::Fatal(e) => {
                    tracing::warn!(
                        error = %e,
                        url = %self.inner.url,
                        retry_count = retry_count,
                        "Request failed"
                    );
                    return Err(e);
                }
            };

            let policy = &self.inner.retry_policy;
            let wait_secs = policy.compute_wait_seconds(signal.retry_after.as_deref(), retry_count);
            let hostname = self.inner.url.host_str().unwrap_or_default();

            if !policy.should_retry(wait_secs, retry_count) {
                tracing::warn!(
                    hostname = hostname,
                    wait_secs = wait_secs,
                    retry_count = retry_count,
                    "Rate limit retries exhausted"
                );
                return Err(Error::LimitExceeded {
                    hostname: hostname.to_string(),
                    retry_after_seconds: wait_secs,
                });
            }

            tracing::info!(
                hostname = hostname,
                wait_secs = wait_secs,
                retry_count = retry_count,
                "Rate limited - waiting before retry"
            );

            if let Some(observer) = &self.inner.observer {
                observer.on_retry(calls, retry_count, wait_secs);
            }

            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
            retry_count += 1;
        }
    }

    fn fail(&self, failure: FailureResponse) -> Error {
        let err = classify_failure(failure);
        tracing::warn!(error = %err, url = %self.inner.url, "Node returned an error");
        err
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use rpclink::{ClientBuilder, RetryPolicy};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), rpclink::Error> {
/// let client = ClientBuilder::new()
///     .url("https://rpc.example.com")?
///     .timeout(Duration::from_secs(30))
///     .retry_policy(RetryPolicy::builder().max_retries(3).build())
///     .user_agent("my-app/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    url: Option<Url>,
    user_agent: HeaderValue,
    headers: HeaderMap,
    retry_policy: RetryPolicy,
    timeout: Option<Duration>,
    proxy_config: Option<ProxyConfig>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    observer: Option<Arc<dyn RequestObserver>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            url: None,
            user_agent: HeaderValue::from_static(DEFAULT_USER_AGENT),
            headers: HeaderMap::new(),
            retry_policy: RetryPolicy::default(),
            timeout: None,
            proxy_config: None,
            dispatcher: None,
            observer: None,
        }
    }

    /// Sets the endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or not http(s).
    pub fn url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(url.as_ref())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::ConfigurationError(format!(
                "Unsupported URL scheme: {}",
                url.scheme()
            )));
        }
        self.url = Some(url);
        Ok(self)
    }

    /// Sets the user agent sent with every exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid header value.
    pub fn user_agent(mut self, user_agent: impl AsRef<str>) -> Result<Self> {
        self.user_agent = HeaderValue::try_from(user_agent.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid user agent: {}", e)))?;
        Ok(self)
    }

    /// Adds a static header that will be included in every exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets the retry policy for rate-limited exchanges.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets the per-attempt timeout of the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the proxy settings used to select the default transport.
    ///
    /// Defaults to [`ProxyConfig::from_env`].
    pub fn proxy_config(mut self, config: ProxyConfig) -> Self {
        self.proxy_config = Some(config);
        self
    }

    /// Replaces the default reqwest transport.
    ///
    /// Timeout and proxy settings are ignored when a dispatcher is supplied.
    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Registers an observer notified about every exchange.
    pub fn observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no URL was provided or the transport cannot be built.
    pub fn build(self) -> Result<Client> {
        let url = self
            .url
            .ok_or_else(|| Error::ConfigurationError("URL is required".to_string()))?;

        let dispatcher = match self.dispatcher {
            Some(dispatcher) => dispatcher,
            None => {
                let proxy_config = self.proxy_config.unwrap_or_else(ProxyConfig::from_env);
                let kind = select_transport(&url, &proxy_config);
                tracing::debug!(url = %url, transport = ?kind, "Selected transport");
                Arc::new(ReqwestDispatcher::new(&kind, self.timeout)?)
            }
        };

        let mut headers = self.headers;
        headers.insert(USER_AGENT, self.user_agent);

        Ok(Client {
            inner: Arc::new(ClientInner {
                url,
                headers,
                dispatcher,
                retry_policy: self.retry_policy,
                observer: self.observer,
                next_id: AtomicU64::new(1),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
