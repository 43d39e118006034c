//! Wire envelope for the mailbox RPC protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version stamped on every request and expected on responses.
pub const PROTOCOL_VERSION: &str = "2.0";

/// One outbound request envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcRequest {
    pub protocol_version: &'static str,
    /// Fresh unique token per call.
    pub id: String,
    pub method: String,
    pub params: Value,
}

impl RpcRequest {
    /// Builds a request with a fresh UUID id.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            method: method.into(),
            params,
        }
    }
}

/// Remote-reported error inside a response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorBody {
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
}

/// One inbound response envelope. Well-formed when it carries `result`
/// or `error`; anything else is malformed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcResponse {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

impl RpcResponse {
    /// Whether the envelope carries a terminal outcome.
    pub fn is_well_formed(&self) -> bool {
        self.result.is_some() || self.error.is_some()
    }
}
