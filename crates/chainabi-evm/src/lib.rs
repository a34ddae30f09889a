//! # chainabi-evm
//!
//! EVM call-data and log decoding against JSON ABI interface definitions,
//! value normalization, and token-standard detection from deployed bytecode.
//!
//! ## Implementation notes
//! - Uses `alloy-core` for ABI decode
//! - Topics[0] → event signature hash (keccak256)
//! - Topics[1..] → indexed parameters (each 32 bytes, ABI-encoded or hashed)
//! - `data` → non-indexed parameters (ABI-encoded sequence)

pub mod bytecode;
pub mod classify;
pub mod decoder;
pub mod normalizer;

pub use bytecode::{matches_all, FragmentSet};
pub use classify::{classify, validate_bytecode, TokenStandard};
pub use decoder::{
    decode_log, decode_log_any, decode_logs, decode_method, decode_method_any, ContractDecoder,
};
pub use normalizer::{normalize, NormalizerOptions};
