//! # rpclink - A JSON-RPC over HTTP client
//!
//! rpclink sends single or batched JSON-RPC 2.0 calls to a remote node over
//! HTTP POST. It assigns and correlates call ids, hands batch results back in
//! submission order, retries rate-limited exchanges with bounded backoff and
//! classifies every failure into a typed [`Error`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use rpclink::Client;
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), rpclink::Error> {
//!     let client = Client::builder()
//!         .url("https://rpc.example.com")?
//!         .timeout(Duration::from_secs(30))
//!         .build()?;
//!
//!     // One call
//!     let block = client.call("chain_getBlock", vec![json!(100)]).await?;
//!     println!("Block: {}", block);
//!
//!     // A batch, results come back in the order submitted
//!     let results = client
//!         .call_batch(vec![
//!             ("chain_getBlock", vec![json!(101)]),
//!             ("chain_getBlock", vec![json!(102)]),
//!         ])
//!         .await?;
//!     println!("Got {} blocks", results.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Id correlation** - Monotonic ids per client, batches reserve a consecutive block
//! - **Batch ordering** - Replies are matched to calls by id, whatever order the node answers in
//! - **Rate-limit retries** - HTTP 429 is retried honoring `Retry-After`, with capped exponential backoff
//! - **Typed errors** - Refused connections, timeouts, exhausted retries and node errors are distinct
//! - **Proxy aware** - Pooled or proxied transport chosen once from `HTTP(S)_PROXY` / `NO_PROXY`
//! - **Pluggable transport** - Swap the reqwest dispatcher for any [`Dispatcher`]
//! - **Structured logging** - Decisions are logged with `tracing`
//!
//! ## Error Handling
//!
//! ```no_run
//! use rpclink::{Client, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().url("https://rpc.example.com")?.build()?;
//! match client.call("chain_getBlock", vec![]).await {
//!     Ok(block) => println!("Block: {}", block),
//!     Err(Error::Provider(e)) => eprintln!("Node error {}: {}", e.code, e.message),
//!     Err(Error::LimitExceeded { hostname, retry_after_seconds }) => {
//!         eprintln!("{} still throttling after retries ({}s)", hostname, retry_after_seconds);
//!     }
//!     Err(Error::ConnectionRefused { url }) => eprintln!("Nothing listening at {}", url),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod classify;
mod client;
pub mod codec;
mod error;
mod observer;
pub mod proxy;
pub mod rate_limit;
pub mod retry;
pub mod transport;

pub use client::{Client, ClientBuilder, DEFAULT_USER_AGENT};
pub use codec::Call;
pub use error::{BoxError, Error, ErrorKind, ProviderError, Result, LIMIT_EXCEEDED_CODE};
pub use observer::RequestObserver;
pub use retry::RetryPolicy;
pub use transport::{Dispatcher, TransportError};
