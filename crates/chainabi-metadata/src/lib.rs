//! # chainabi-metadata
//!
//! Contract metadata cache: classifies contracts from their deployed
//! bytecode, reads `name`/`symbol`/`decimals`, and hands out decoders bound
//! to the matching standard interface.
//!
//! Chain access goes through the [`ChainClient`](chainabi_core::ChainClient)
//! trait. Enable the `http` feature for the bundled JSON-RPC implementation.

pub mod cache;
pub mod config;
pub mod error;
pub mod metadata;
#[cfg(feature = "http")]
pub mod rpc;
pub mod scanner;

pub use cache::{CacheStats, MetadataCache};
pub use config::{MetadataConfig, RpcClientConfig};
pub use error::MetadataError;
pub use metadata::ContractMetadata;
#[cfg(feature = "http")]
pub use rpc::JsonRpcChainClient;
pub use scanner::TxScanner;
