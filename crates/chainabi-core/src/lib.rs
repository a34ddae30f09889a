//! # chainabi-core
//!
//! Core types shared across all ChainABI crates: the normalized value model,
//! raw and decoded call/log types, the error taxonomy, and the `ChainClient`
//! trait through which the metadata cache talks to a node.

pub mod call;
pub mod client;
pub mod constants;
pub mod error;
pub mod event;
pub mod types;

pub use call::{DecodedCall, RawTransaction};
pub use client::ChainClient;
pub use constants::{TRANSFER_TOPIC, ZERO_ADDRESS};
pub use error::{ClientError, DecodeError, RegistryError};
pub use event::{DecodedEvent, LogFilter, RawLog};
pub use types::{NormalizedValue, Parameters};
