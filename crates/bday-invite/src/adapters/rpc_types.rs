//! JSON-RPC wire types for the ledger node API.

use serde::{Deserialize, Serialize};

/// JSON-RPC request structure
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<T> {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: T,
    pub id: u64,
}

impl<T> JsonRpcRequest<T> {
    pub fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC Error {}: {}", self.code, self.message)
    }
}

/// Result wrapped with the slot it was read at.
#[derive(Debug, Deserialize)]
pub struct WithContext<T> {
    pub value: T,
}

/// Account as returned with `"encoding": "base64"`.
#[derive(Debug, Deserialize)]
pub struct UiAccount {
    /// `[data, "base64"]`
    pub data: (String, String),
    pub owner: String,
}

/// Entry of `getProgramAccounts`.
#[derive(Debug, Deserialize)]
pub struct KeyedAccount {
    pub pubkey: String,
    pub account: UiAccount,
}

/// Body of `getLatestBlockhash`.
#[derive(Debug, Deserialize)]
pub struct LatestBlockhash {
    pub blockhash: String,
}
