//! Basic example demonstrating single JSON-RPC calls.
//!
//! This example shows how to:
//! - Create a client with basic configuration
//! - Make a single call and read its result
//! - Tell node errors apart from transport errors
//!
//! Point it at any JSON-RPC node with `RPC_URL` (defaults to a local node).
//!
//! Run with: `cargo run --example basic_call`

use rpclink::{Client, Error};
use serde_json::json;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("rpclink=debug,basic_call=info")
        .init();

    let url = std::env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string());

    let client = Client::builder()
        .url(&url)?
        .timeout(Duration::from_secs(10))
        .build()?;

    println!("=== Single Call Example ===");
    let block_number = client.call("eth_blockNumber", vec![]).await?;
    println!("Latest block: {}", block_number);
    println!();

    println!("=== Node Error Example ===");
    // Unknown methods come back as an error object from the node
    match client.call("no_such_method", vec![json!(1)]).await {
        Ok(result) => println!("Unexpected success: {}", result),
        Err(Error::Provider(e)) => {
            println!("Node error code: {}", e.code);
            println!("Message: {}", e.message);
            println!("Data: {:?}", e.data);
        }
        Err(e) => return Err(e),
    }

    Ok(())
}
