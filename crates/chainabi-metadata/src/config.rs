//! Metadata cache and JSON-RPC client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`MetadataCache`](crate::MetadataCache).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Upper bound for every chain-client call, in milliseconds
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Report pass-through values from decoders handed out by the cache
    #[serde(default)]
    pub debug: bool,
}

fn default_call_timeout_ms() -> u64 {
    10_000
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
            debug: false,
        }
    }
}

impl MetadataConfig {
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Configuration for the HTTP JSON-RPC chain client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcClientConfig {
    /// HTTP(S) JSON-RPC endpoint, e.g. "https://eth.llamarpc.com"
    pub url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl RpcClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
