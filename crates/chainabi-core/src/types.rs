//! The normalized value model.
//!
//! Decoded ABI values are converted into `NormalizedValue` so consumers get a
//! portable, JSON-safe representation: integers become decimal strings,
//! addresses are EIP-55 checksummed, byte sequences are `0x`-prefixed hex.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Decoded parameters in declaration order, keyed by parameter name.
pub type Parameters = IndexMap<String, NormalizedValue>;

/// A decoded, normalized value.
///
/// Serializes untagged: every string-like variant is a JSON string, `Uint8`
/// is a JSON number, `List` an array and `Tuple` an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    Text(String),
    Boolean(bool),
    /// Arbitrary-precision integer rendered in base 10.
    DecimalString(String),
    /// EIP-55 checksummed `0x` address.
    ChecksumAddress(String),
    /// `0x`-prefixed lowercase hex.
    HexBytes(String),
    /// Unsigned integers of at most 8 bits pass through unchanged.
    Uint8(u8),
    List(Vec<NormalizedValue>),
    /// Struct values, fields in declaration order.
    Tuple(Parameters),
}

impl NormalizedValue {
    /// Hex-encode raw bytes as `0x…` lowercase.
    pub fn hex_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self::HexBytes(format!("0x{}", hex::encode(bytes)))
    }

    /// The inner string for every string-like variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s)
            | Self::DecimalString(s)
            | Self::ChecksumAddress(s)
            | Self::HexBytes(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&str> {
        match self {
            Self::ChecksumAddress(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&str> {
        match self {
            Self::DecimalString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[NormalizedValue]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedValue::Text(s)
            | NormalizedValue::DecimalString(s)
            | NormalizedValue::ChecksumAddress(s)
            | NormalizedValue::HexBytes(s) => write!(f, "{s}"),
            NormalizedValue::Boolean(b) => write!(f, "{b}"),
            NormalizedValue::Uint8(v) => write!(f, "{v}"),
            NormalizedValue::List(items) => {
                let parts: Vec<_> = items.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            NormalizedValue::Tuple(fields) => {
                let parts: Vec<_> = fields.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}
