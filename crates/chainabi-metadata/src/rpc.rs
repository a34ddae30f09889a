//! HTTP JSON-RPC `ChainClient` backed by `reqwest`.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chainabi_core::{ChainClient, ClientError, LogFilter, RawLog, RawTransaction};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::RpcClientConfig;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

impl RpcResponse {
    fn into_result(self) -> Result<Value, ClientError> {
        match self.error {
            Some(err) => Err(ClientError::Rpc {
                code: err.code,
                message: err.message,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// A receipt log as nodes return it: numbers are hex quantities.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: String,
    topics: Vec<String>,
    data: String,
    #[serde(default)]
    transaction_hash: Option<String>,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    log_index: Option<String>,
}

/// JSON-RPC client speaking `eth_getCode`, `eth_call`,
/// `eth_getTransactionByHash`, `eth_getTransactionReceipt` and `eth_getLogs`.
pub struct JsonRpcChainClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcChainClient {
    pub fn new(config: RpcClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            url: config.url,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(RpcClientConfig::new(url))
    }

    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError> {
        let req = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(url = %self.url, method, status, "JSON-RPC request rejected");
            return Err(ClientError::Transport(format!("HTTP {status}: {body}")));
        }

        let body: RpcResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        tracing::debug!(method, "JSON-RPC response");
        body.into_result()
    }
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    async fn code_at(&self, address: &str) -> Result<Vec<u8>, ClientError> {
        let result = self
            .request("eth_getCode", vec![json!(address), json!("latest")])
            .await?;
        parse_hex_bytes(&result)
    }

    async fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, ClientError> {
        let tx = json!({ "to": to, "data": format!("0x{}", hex::encode(data)) });
        let result = self
            .request("eth_call", vec![tx, json!("latest")])
            .await?;
        parse_hex_bytes(&result)
    }

    async fn transaction_by_hash(&self, hash: &str) -> Result<Option<RawTransaction>, ClientError> {
        let result = self
            .request("eth_getTransactionByHash", vec![json!(hash)])
            .await?;
        parse_transaction(result)
    }

    async fn receipt_logs(&self, hash: &str) -> Result<Vec<RawLog>, ClientError> {
        let result = self
            .request("eth_getTransactionReceipt", vec![json!(hash)])
            .await?;
        parse_receipt_logs(result)
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, ClientError> {
        let result = self
            .request("eth_getLogs", vec![filter_params(filter)])
            .await?;
        if result.is_null() {
            return Ok(vec![]);
        }
        parse_logs(result)
    }

    fn name(&self) -> &str {
        &self.url
    }
}

// ─── Response parsing ────────────────────────────────────────────────────────

fn parse_hex_bytes(value: &Value) -> Result<Vec<u8>, ClientError> {
    let s = value
        .as_str()
        .ok_or_else(|| ClientError::InvalidResponse(format!("expected hex string, got {value}")))?;
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|e| ClientError::InvalidResponse(format!("bad hex: {e}")))
}

fn parse_hex_u64(s: &str) -> Result<u64, ClientError> {
    u64::from_str_radix(s.strip_prefix("0x").unwrap_or(s), 16)
        .map_err(|e| ClientError::InvalidResponse(format!("bad quantity '{s}': {e}")))
}

fn parse_transaction(value: Value) -> Result<Option<RawTransaction>, ClientError> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

fn parse_receipt_logs(value: Value) -> Result<Vec<RawLog>, ClientError> {
    if value.is_null() {
        tracing::debug!("receipt not found");
        return Ok(vec![]);
    }
    let logs = value
        .get("logs")
        .cloned()
        .ok_or_else(|| ClientError::InvalidResponse("receipt has no logs field".into()))?;
    parse_logs(logs)
}

fn parse_logs(value: Value) -> Result<Vec<RawLog>, ClientError> {
    let logs: Vec<RpcLog> =
        serde_json::from_value(value).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

    logs.into_iter()
        .map(|log| {
            Ok(RawLog {
                address: log.address,
                topics: log.topics,
                data: parse_hex_bytes(&Value::String(log.data))?,
                transaction_hash: log.transaction_hash.unwrap_or_default(),
                block_number: log.block_number.as_deref().map(parse_hex_u64).transpose()?.unwrap_or(0),
                log_index: log.log_index.as_deref().map(parse_hex_u64).transpose()?.unwrap_or(0) as u32,
            })
        })
        .collect()
}

// ─── Request building ────────────────────────────────────────────────────────

/// `eth_getLogs` filter object. A single address is sent as a string,
/// trailing wildcard topics are dropped.
fn filter_params(filter: &LogFilter) -> Value {
    let mut params = serde_json::Map::new();
    match filter.addresses.as_slice() {
        [] => {}
        [one] => {
            params.insert("address".into(), json!(one));
        }
        many => {
            params.insert("address".into(), json!(many));
        }
    }
    let used = filter
        .topics
        .iter()
        .rposition(Option::is_some)
        .map_or(0, |last| last + 1);
    if used > 0 {
        params.insert("topics".into(), json!(&filter.topics[..used]));
    }
    if let Some(from) = filter.from_block {
        params.insert("fromBlock".into(), json!(format!("0x{from:x}")));
    }
    if let Some(to) = filter.to_block {
        params.insert("toBlock".into(), json!(format!("0x{to:x}")));
    }
    Value::Object(params)
}
