//! Example demonstrating batched JSON-RPC calls.
//!
//! This example shows how to:
//! - Send several calls in one exchange
//! - Rely on results coming back in submission order
//! - Observe rate-limit retries with a `RequestObserver`
//! - Handle a batch failing as a whole
//!
//! Point it at any JSON-RPC node with `RPC_URL` (defaults to a local node).
//!
//! Run with: `cargo run --example batch`

use rpclink::{Call, Client, Error, RequestObserver, RetryPolicy};
use serde_json::json;
use std::sync::Arc;

struct PrintRetries;

impl RequestObserver for PrintRetries {
    fn on_retry(&self, calls: &[Call], retry_count: u32, wait_secs: u64) {
        println!(
            "Rate limited: resending {} call(s) in {}s (retry #{})",
            calls.len(),
            wait_secs,
            retry_count + 1
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("rpclink=debug,batch=info")
        .init();

    let url = std::env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string());

    let client = Client::builder()
        .url(&url)?
        .retry_policy(RetryPolicy::builder().max_retries(3).build())
        .observer(Arc::new(PrintRetries))
        .build()?;

    println!("=== Batch Example ===");
    let blocks = client
        .call_batch((0..3).map(|n| {
            (
                "eth_getBlockByNumber",
                vec![json!(format!("0x{:x}", n)), json!(false)],
            )
        }))
        .await?;

    for (n, block) in blocks.iter().enumerate() {
        println!("Block {}: hash {}", n, block["hash"]);
    }
    println!();

    println!("=== Failing Batch Example ===");
    // One bad call fails the whole batch, the other results are discarded
    match client
        .call_batch(vec![
            ("eth_chainId", vec![]),
            ("no_such_method", vec![]),
            ("eth_blockNumber", vec![]),
        ])
        .await
    {
        Ok(results) => println!("Unexpected success: {:?}", results),
        Err(Error::Provider(e)) => {
            println!("Batch failed with node error {}: {}", e.code, e.message)
        }
        Err(Error::LimitExceeded {
            hostname,
            retry_after_seconds,
        }) => println!("{} kept throttling (last wait {}s)", hostname, retry_after_seconds),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
