//! The `ChainClient` trait: the collaborator through which ChainABI reads
//! chain state.
//!
//! The core never talks to a node directly. Callers inject an implementation
//! (the JSON-RPC client in `chainabi-metadata`, or an in-memory mock in
//! tests) and the metadata cache wraps every call in a timeout.

use async_trait::async_trait;

use crate::call::RawTransaction;
use crate::error::ClientError;
use crate::event::{LogFilter, RawLog};

/// Read-only access to an EVM chain.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so they can be shared as
/// `Arc<dyn ChainClient>` across Tokio tasks.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Deployed bytecode at `address` (empty for EOAs).
    async fn code_at(&self, address: &str) -> Result<Vec<u8>, ClientError>;

    /// Execute a read-only call and return the raw return bytes.
    async fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, ClientError>;

    /// Fetch a transaction by hash. `Ok(None)` if the node does not know it.
    async fn transaction_by_hash(&self, hash: &str) -> Result<Option<RawTransaction>, ClientError>;

    /// Fetch the logs of a transaction's receipt.
    async fn receipt_logs(&self, hash: &str) -> Result<Vec<RawLog>, ClientError>;

    /// Logs matching `filter`, in chain order.
    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, ClientError>;

    /// Identifier used in log lines (URL or name).
    fn name(&self) -> &str {
        "chain-client"
    }
}
