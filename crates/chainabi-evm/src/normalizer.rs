//! Converts alloy-core `DynSolValue` → ChainABI `NormalizedValue`.
//!
//! Integers wider than 8 bits become base-10 strings so they survive JSON
//! consumers limited to 53-bit numbers; addresses come out EIP-55
//! checksummed; every byte sequence is `0x` + lowercase hex.

use std::str::FromStr;

use alloy_core::dyn_abi::DynSolValue;
use alloy_primitives::Address;
use chainabi_core::types::{NormalizedValue, Parameters};
use chainabi_core::ZERO_ADDRESS;
use chainabi_registry::ParamSpec;
use tracing::debug;

/// Knobs for value normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizerOptions {
    /// Report values that pass through without a dedicated mapping
    /// (tuples, function pointers) at `debug` level.
    pub debug: bool,
}

/// Convert a decoded value. Tuple fields get positional names "0", "1", …
pub fn normalize(val: DynSolValue) -> NormalizedValue {
    convert(val, &[], NormalizerOptions::default())
}

/// Convert a decoded value, naming tuple fields after the parameter's
/// declared components.
pub fn normalize_param(
    val: DynSolValue,
    spec: &ParamSpec,
    opts: NormalizerOptions,
) -> NormalizedValue {
    convert(val, &spec.components, opts)
}

fn convert(val: DynSolValue, components: &[ParamSpec], opts: NormalizerOptions) -> NormalizedValue {
    match val {
        DynSolValue::Bool(b) => NormalizedValue::Boolean(b),

        DynSolValue::Int(i, _bits) => NormalizedValue::DecimalString(i.to_string()),

        DynSolValue::Uint(u, bits) => {
            if bits <= 8 {
                match u8::try_from(u) {
                    Ok(v) => NormalizedValue::Uint8(v),
                    Err(_) => NormalizedValue::DecimalString(u.to_string()),
                }
            } else {
                NormalizedValue::DecimalString(u.to_string())
            }
        }

        DynSolValue::FixedBytes(word, size) => NormalizedValue::hex_bytes(&word[..size]),

        DynSolValue::Bytes(b) => NormalizedValue::hex_bytes(b),

        DynSolValue::Address(a) => NormalizedValue::ChecksumAddress(a.to_checksum(None)),

        DynSolValue::String(s) => match address_literal(&s) {
            Some(addr) => NormalizedValue::ChecksumAddress(addr.to_checksum(None)),
            None => NormalizedValue::Text(s),
        },

        DynSolValue::Array(vals) | DynSolValue::FixedArray(vals) => NormalizedValue::List(
            vals.into_iter()
                .map(|v| convert(v, components, opts))
                .collect(),
        ),

        DynSolValue::Tuple(fields) => {
            if opts.debug {
                debug!(fields = fields.len(), "tuple value passed through as struct");
            }
            let named: Parameters = fields
                .into_iter()
                .enumerate()
                .map(|(i, v)| match components.get(i) {
                    Some(spec) => (spec.name.clone(), convert(v, &spec.components, opts)),
                    None => (i.to_string(), convert(v, &[], opts)),
                })
                .collect();
            NormalizedValue::Tuple(named)
        }

        DynSolValue::Function(f) => {
            if opts.debug {
                debug!(value = %f, "function pointer passed through as bytes");
            }
            NormalizedValue::hex_bytes(f)
        }
    }
}

/// A string holding a 40-digit hex address (with or without `0x`) that is
/// not the zero address.
fn address_literal(s: &str) -> Option<Address> {
    if s.eq_ignore_ascii_case(ZERO_ADDRESS) {
        return None;
    }
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Address::from_str(digits).ok().filter(|a| !a.is_zero())
}

/// EIP-55 form of an address string; anything unparseable is returned as is.
pub fn checksum(address: &str) -> String {
    match Address::from_str(address) {
        Ok(a) => a.to_checksum(None),
        Err(_) => address.to_string(),
    }
}
