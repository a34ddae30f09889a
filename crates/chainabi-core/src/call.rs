//! Raw transaction input and decoded function-call types.

use crate::types::{NormalizedValue, Parameters};
use serde::{Deserialize, Serialize};

/// The parts of a transaction needed to decode its call data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    /// Transaction hash (0x-prefixed hex)
    pub hash: String,
    /// Call target; `None` for contract creations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Raw call data including the 4-byte selector
    #[serde(with = "hex_bytes")]
    pub input: Vec<u8>,
}

impl RawTransaction {
    pub fn new(to: Option<String>, input: Vec<u8>) -> Self {
        Self {
            hash: String::new(),
            to,
            input,
        }
    }

    /// Build from `0x`-prefixed (or bare) call-data hex.
    pub fn from_hex(to: Option<String>, input_hex: &str) -> Result<Self, hex::FromHexError> {
        let input = hex::decode(input_hex.strip_prefix("0x").unwrap_or(input_hex))?;
        Ok(Self::new(to, input))
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }
}

/// Result of decoding a function call's calldata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedCall {
    /// Called contract (checksummed), or the zero address for creations
    #[serde(rename = "contract")]
    pub contract_address: String,
    /// Function name, e.g. "transfer"
    pub name: String,
    /// Canonical signature, e.g. "transfer(address,uint256)"
    pub signature: String,
    /// 4-byte selector as "0xaabbccdd"
    #[serde(rename = "selector")]
    pub selector_hex: String,
    /// Decoded inputs in declaration order
    pub parameters: Parameters,
    pub transaction_hash: String,
}

impl DecodedCall {
    /// Look up a decoded input by name.
    pub fn param(&self, name: &str) -> Option<&NormalizedValue> {
        self.parameters.get(name)
    }
}

/// serde adapter: `Vec<u8>` as `0x`-prefixed hex.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}
