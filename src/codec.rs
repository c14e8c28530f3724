//! JSON-RPC 2.0 envelope types and the functions that encode and decode them.
//!
//! Ids on the wire are plain numbers, but some nodes echo them back as
//! numeric strings, so both forms are accepted when decoding.

use crate::{Error, Result};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// JSON-RPC protocol version sent with every call.
pub const JSONRPC_VERSION: &str = "2.0";

/// One outgoing procedure call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call {
    /// Always [`JSONRPC_VERSION`].
    pub jsonrpc: &'static str,
    /// Correlation id assigned by the client.
    pub id: u64,
    /// Name of the remote procedure.
    pub method: String,
    /// Positional parameters.
    pub params: Vec<Value>,
}

impl Call {
    /// Builds a call with the given id.
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }
}

/// Error object carried by a [`FailureResponse`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorObject {
    /// Numeric error code.
    pub code: i64,
    /// Short description.
    #[serde(default)]
    pub message: String,
    /// Optional diagnostic payload.
    #[serde(default)]
    pub data: Option<Value>,
}

/// A successful reply to a [`Call`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SuccessResponse {
    /// Echo of the originating call's id.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    /// The procedure's return value.
    pub result: Value,
}

/// A failed reply to a [`Call`].
///
/// The id is optional because nodes answer requests they could not parse
/// with a `null` id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FailureResponse {
    /// Echo of the originating call's id, if the node could determine it.
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<u64>,
    /// The error reported by the node.
    pub error: ErrorObject,
}

/// A decoded reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RpcResponse {
    /// The node reported an error.
    Failure(FailureResponse),
    /// The node returned a result.
    Success(SuccessResponse),
}

impl RpcResponse {
    /// Returns `true` if this reply carries an error object.
    pub fn is_failure(&self) -> bool {
        matches!(self, RpcResponse::Failure(_))
    }

    /// Returns the echoed call id, if present.
    pub fn id(&self) -> Option<u64> {
        match self {
            RpcResponse::Failure(f) => f.id,
            RpcResponse::Success(s) => Some(s.id),
        }
    }
}

/// A decoded response body: either one reply or a batch of replies.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Reply to a batch.
    Batch(Vec<RpcResponse>),
    /// Reply to a single call.
    Single(RpcResponse),
}

/// Encodes a call or a batch of calls into a request body.
pub fn encode<T: Serialize + ?Sized>(calls: &T) -> Result<String> {
    serde_json::to_string(calls).map_err(|e| Error::SerializationFailed(e.to_string()))
}

/// Decodes a raw response body.
///
/// # Errors
///
/// Returns [`Error::DeserializationFailed`] with the raw body if it is not a
/// JSON-RPC response or batch of responses.
pub fn parse_response(raw_body: &str) -> Result<Payload> {
    serde_json::from_str(raw_body).map_err(|e| {
        tracing::error!(
            error = %e,
            raw_response = %raw_body,
            "Failed to decode JSON-RPC response"
        );

        Error::DeserializationFailed {
            raw_response: raw_body.to_string(),
            serde_error: e.to_string(),
        }
    })
}

fn id_from_value<E: de::Error>(value: Value) -> std::result::Result<u64, E> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| E::custom(format!("invalid id: {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid id: {:?}", s))),
        other => Err(E::custom(format!("invalid id: {}", other))),
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    id_from_value(Value::deserialize(deserializer)?)
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => id_from_value(value).map(Some),
    }
}
