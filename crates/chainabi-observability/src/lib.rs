//! # chainabi-observability
//!
//! Logging and metrics setup shared by the ChainABI binaries.
//!
//! ## Built-in metrics
//! - `chainabi.calls_decoded`: counter, tagged with method signature
//! - `chainabi.events_decoded`: counter, tagged with event signature
//! - `chainabi.decode_errors`: counter, tagged with error kind
//! - `chainabi.cache_hits`: counter
//! - `chainabi.cache_misses`: counter
//!
//! ## Structured logging
//! Human-readable or JSON lines, with per-crate level overrides.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::ChainAbiMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
