//! Fetch a transaction, a receipt or a filtered log range through the chain
//! client and decode it.

use std::sync::Arc;

use chainabi_core::{ChainClient, DecodedCall, DecodedEvent, LogFilter, RawLog};
use chainabi_evm::{decode_logs, decode_method_any, ContractDecoder};
use chainabi_registry::InterfaceDefinition;
use tracing::debug;

use crate::cache::timed;
use crate::config::MetadataConfig;
use crate::error::MetadataError;

pub struct TxScanner {
    client: Arc<dyn ChainClient>,
    call_timeout_ms: u64,
}

impl TxScanner {
    pub fn new(client: Arc<dyn ChainClient>, config: &MetadataConfig) -> Self {
        Self {
            client,
            call_timeout_ms: config.call_timeout_ms,
        }
    }

    /// Decode the call data of transaction `hash` with a bound decoder.
    pub async fn decode_transaction(
        &self,
        hash: &str,
        decoder: &ContractDecoder,
    ) -> Result<DecodedCall, MetadataError> {
        let tx = self.fetch_transaction(hash).await?;
        Ok(decoder.decode_call(&tx)?)
    }

    /// Decode the call data of transaction `hash` against ordered candidates.
    pub async fn decode_transaction_any(
        &self,
        hash: &str,
        candidates: &[Arc<InterfaceDefinition>],
    ) -> Result<DecodedCall, MetadataError> {
        let tx = self.fetch_transaction(hash).await?;
        Ok(decode_method_any(&tx, candidates)?)
    }

    /// Decode every log of the receipt of `hash` with a bound decoder.
    /// Logs the decoder does not recognise are skipped.
    pub async fn decode_receipt(
        &self,
        hash: &str,
        decoder: &ContractDecoder,
    ) -> Result<Vec<DecodedEvent>, MetadataError> {
        let logs = timed(self.call_timeout_ms, self.client.receipt_logs(hash)).await?;
        debug!(tx = %hash, logs = logs.len(), "fetched receipt");
        Ok(decoder.decode_logs(&logs))
    }

    /// Decode every log of the receipt of `hash` against ordered candidates.
    pub async fn decode_receipt_any(
        &self,
        hash: &str,
        candidates: &[Arc<InterfaceDefinition>],
    ) -> Result<Vec<DecodedEvent>, MetadataError> {
        let logs = timed(self.call_timeout_ms, self.client.receipt_logs(hash)).await?;
        debug!(tx = %hash, logs = logs.len(), "fetched receipt");
        Ok(decode_logs(&logs, candidates))
    }

    /// Query logs matching `filter` and decode them with a bound decoder.
    /// Logs the decoder does not recognise are skipped.
    pub async fn decode_filtered_logs(
        &self,
        filter: &LogFilter,
        decoder: &ContractDecoder,
    ) -> Result<Vec<DecodedEvent>, MetadataError> {
        let logs = self.fetch_logs(filter).await?;
        Ok(decoder.decode_logs(&logs))
    }

    /// Query logs matching `filter` and decode them against ordered candidates.
    pub async fn decode_filtered_logs_any(
        &self,
        filter: &LogFilter,
        candidates: &[Arc<InterfaceDefinition>],
    ) -> Result<Vec<DecodedEvent>, MetadataError> {
        let logs = self.fetch_logs(filter).await?;
        Ok(decode_logs(&logs, candidates))
    }

    async fn fetch_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, MetadataError> {
        let logs = timed(self.call_timeout_ms, self.client.logs(filter)).await?;
        debug!(
            from = ?filter.from_block,
            to = ?filter.to_block,
            logs = logs.len(),
            "fetched filtered logs"
        );
        Ok(logs)
    }

    async fn fetch_transaction(
        &self,
        hash: &str,
    ) -> Result<chainabi_core::RawTransaction, MetadataError> {
        timed(self.call_timeout_ms, self.client.transaction_by_hash(hash))
            .await?
            .ok_or_else(|| MetadataError::TransactionNotFound {
                hash: hash.to_string(),
            })
    }
}
