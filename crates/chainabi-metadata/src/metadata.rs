//! Contract metadata and view-call return decoding.

use std::sync::Arc;

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use chainabi_evm::TokenStandard;
use chainabi_registry::InterfaceDefinition;
use serde::{Deserialize, Serialize};

/// `name()`
pub const NAME_SELECTOR: [u8; 4] = [0x06, 0xfd, 0xde, 0x03];
/// `symbol()`
pub const SYMBOL_SELECTOR: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];
/// `decimals()`
pub const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

/// What is known about one deployed contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractMetadata {
    /// EIP-55 checksummed address
    pub address: String,
    pub standard: TokenStandard,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    /// The standard was derived from the deployed bytecode rather than
    /// supplied by the caller.
    #[serde(default)]
    pub verified: bool,
    /// Deployed code as `0x` hex, when it was fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode: Option<String>,
    /// Interface future decodes of this address use. Filled in by the cache
    /// from `standard` when not supplied.
    #[serde(skip)]
    pub interface: Option<Arc<InterfaceDefinition>>,
}

impl ContractMetadata {
    pub fn new(address: impl Into<String>, standard: TokenStandard) -> Self {
        Self {
            address: address.into(),
            standard,
            name: None,
            symbol: None,
            decimals: None,
            verified: false,
            bytecode: None,
            interface: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = Some(decimals);
        self
    }

    pub fn with_bytecode(mut self, code: &[u8]) -> Self {
        self.bytecode = Some(format!("0x{}", hex::encode(code)));
        self
    }

    /// Pin the interface used by decoders bound to this address.
    pub fn with_interface(mut self, interface: Arc<InterfaceDefinition>) -> Self {
        self.interface = Some(interface);
        self
    }

    pub fn is_token(&self) -> bool {
        self.standard.is_token()
    }
}

/// Decode a `name()`/`symbol()` return value.
///
/// Most tokens return an ABI `string`; some early ones (MKR, SAI) return a
/// `bytes32` padded with NULs. Returns `None` for empty or unreadable data.
pub fn decode_text(ret: &[u8]) -> Option<String> {
    let abi_string = DynSolType::Tuple(vec![DynSolType::String])
        .abi_decode_params(ret)
        .ok()
        .and_then(|v| match v {
            DynSolValue::Tuple(mut vals) if vals.len() == 1 => match vals.remove(0) {
                DynSolValue::String(s) => Some(s),
                _ => None,
            },
            _ => None,
        });
    let text = match abi_string {
        Some(s) => s,
        None if ret.len() >= 32 => printable(&ret[..32]),
        None => return None,
    };
    let text = text.trim_matches(char::from(0)).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Printable ASCII of a NUL-padded word.
fn printable(word: &[u8]) -> String {
    word.iter()
        .take_while(|b| **b != 0)
        .filter(|b| b.is_ascii_graphic() || **b == b' ')
        .map(|b| char::from(*b))
        .collect()
}

/// Decode a `decimals()` return value. Values above 255 are rejected.
pub fn decode_decimals(ret: &[u8]) -> Option<u8> {
    match DynSolType::Tuple(vec![DynSolType::Uint(256)]).abi_decode_params(ret) {
        Ok(DynSolValue::Tuple(vals)) => match vals.first() {
            Some(DynSolValue::Uint(u, _)) => u8::try_from(*u).ok(),
            _ => None,
        },
        _ => None,
    }
}
