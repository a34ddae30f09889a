//! ChainABI metric handles.
//!
//! Instruments come from whatever `MeterProvider` the host installed; with
//! none installed the global no-op provider makes every record a no-op.

use chainabi_core::DecodeError;
use opentelemetry::{
    global,
    metrics::{Counter, Meter},
    KeyValue,
};

#[derive(Clone)]
pub struct ChainAbiMetrics {
    pub calls_decoded: Counter<u64>,
    pub events_decoded: Counter<u64>,
    pub decode_errors: Counter<u64>,
    pub cache_hits: Counter<u64>,
    pub cache_misses: Counter<u64>,
}

impl ChainAbiMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            calls_decoded: meter
                .u64_counter("chainabi.calls_decoded")
                .with_description("Transactions whose calldata decoded against an interface")
                .build(),
            events_decoded: meter
                .u64_counter("chainabi.events_decoded")
                .with_description("Logs decoded against an interface")
                .build(),
            decode_errors: meter
                .u64_counter("chainabi.decode_errors")
                .with_description("Calls and logs that failed to decode")
                .build(),
            cache_hits: meter
                .u64_counter("chainabi.cache_hits")
                .with_description("Metadata lookups served from the cache")
                .build(),
            cache_misses: meter
                .u64_counter("chainabi.cache_misses")
                .with_description("Metadata lookups that resolved through the chain client")
                .build(),
        }
    }

    /// Handles on the global meter named `chainabi`.
    pub fn global() -> Self {
        Self::new(&global::meter("chainabi"))
    }

    pub fn record_call(&self, signature: &str) {
        self.calls_decoded
            .add(1, &[KeyValue::new("signature", signature.to_string())]);
    }

    pub fn record_event(&self, signature: &str) {
        self.events_decoded
            .add(1, &[KeyValue::new("signature", signature.to_string())]);
    }

    pub fn record_error(&self, err: &DecodeError) {
        self.decode_errors
            .add(1, &[KeyValue::new("error_type", error_kind(err))]);
    }

    /// Add cache counter deltas, e.g. the stats of one CLI run.
    pub fn record_cache(&self, hits: u64, misses: u64) {
        if hits > 0 {
            self.cache_hits.add(hits, &[]);
        }
        if misses > 0 {
            self.cache_misses.add(misses, &[]);
        }
    }
}

/// Stable label for the `error_type` attribute.
pub fn error_kind(err: &DecodeError) -> &'static str {
    match err {
        DecodeError::NoMatch { .. } => "no_match",
        DecodeError::AbiDecodeFailed { .. } => "abi_decode_failed",
        DecodeError::InvalidInput { .. } => "invalid_input",
        DecodeError::NotConfigured => "not_configured",
    }
}
