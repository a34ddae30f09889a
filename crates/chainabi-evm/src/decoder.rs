//! Call-data and log decoding against interface definitions.
//!
//! # How it works
//! - First 4 bytes of calldata = keccak256(function_signature)[:4] (the selector)
//! - Remaining bytes = ABI-encoded inputs, laid out as a parameter sequence
//! - topics[0] of a log = keccak256(event_signature); topics[1..] hold the
//!   indexed inputs in declaration order; `data` holds the rest
//!
//! All functions here are pure. The `_any` variants walk an ordered list of
//! candidate interfaces and stop at the first one that decodes.

use std::sync::Arc;

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Address;
use chainabi_core::{
    DecodeError, DecodedCall, DecodedEvent, NormalizedValue, Parameters, RawLog, RawTransaction,
    ZERO_ADDRESS,
};
use chainabi_registry::{fingerprint, EventSignature, InterfaceDefinition, ParamSpec};
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::normalizer::{self, NormalizerOptions};

/// Events whose non-indexed payload may fail to unpack without failing the
/// whole decode. Token contracts in the wild emit these with non-standard
/// data layouts often enough that the indexed parameters alone are useful.
pub const TOLERATED_EVENTS: [&str; 3] = ["Approval", "Transfer", "Deposit"];

// ─── Single interface ───────────────────────────────────────────────────────

/// Decode a transaction's call data against one interface.
pub fn decode_method(
    tx: &RawTransaction,
    interface: &InterfaceDefinition,
) -> Result<DecodedCall, DecodeError> {
    decode_method_with(tx, interface, NormalizerOptions::default())
}

pub fn decode_method_with(
    tx: &RawTransaction,
    interface: &InterfaceDefinition,
    opts: NormalizerOptions,
) -> Result<DecodedCall, DecodeError> {
    if tx.input.len() < 4 {
        return Err(DecodeError::no_method(&tx.input));
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&tx.input[..4]);

    let method = interface
        .method_by_selector(selector)
        .ok_or_else(|| DecodeError::no_method(&selector))?;

    let parameters = decode_params(&method.inputs, &tx.input[4..], &method.signature, opts)?;

    trace!(method = %method.signature, "decoded call");
    Ok(DecodedCall {
        contract_address: tx
            .to
            .as_deref()
            .map(normalizer::checksum)
            .unwrap_or_else(|| ZERO_ADDRESS.to_string()),
        name: method.name.clone(),
        signature: method.signature.clone(),
        selector_hex: method.selector_hex(),
        parameters,
        transaction_hash: tx.hash.clone(),
    })
}

/// Decode a log against one interface.
pub fn decode_log(log: &RawLog, interface: &InterfaceDefinition) -> Result<DecodedEvent, DecodeError> {
    decode_log_with(log, interface, NormalizerOptions::default())
}

pub fn decode_log_with(
    log: &RawLog,
    interface: &InterfaceDefinition,
    opts: NormalizerOptions,
) -> Result<DecodedEvent, DecodeError> {
    let topic0 = log.topic0().ok_or_else(|| DecodeError::InvalidInput {
        reason: "log has no topics".into(),
    })?;
    let topic = fingerprint::parse_topic(topic0).ok_or_else(|| DecodeError::InvalidInput {
        reason: format!("malformed topic0 '{topic0}'"),
    })?;
    let event = interface
        .event_by_topic(&topic)
        .ok_or_else(|| DecodeError::no_event(topic0))?;

    // One slot per declared input so indexed and data values interleave in
    // declaration order.
    let mut slots: Vec<Option<NormalizedValue>> = vec![None; event.inputs.len()];

    let indexed = event
        .inputs
        .iter()
        .enumerate()
        .filter(|(_, p)| p.indexed)
        .zip(log.topics.iter().skip(1));
    for ((slot, spec), topic_hex) in indexed {
        slots[slot] = decode_topic(spec, topic_hex, opts);
    }

    let data_specs: Vec<(usize, &ParamSpec)> = event
        .inputs
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.indexed)
        .collect();
    if !data_specs.is_empty() {
        match decode_data(event, &data_specs, &log.data, opts) {
            Ok(values) => {
                for (slot, value) in values {
                    slots[slot] = Some(value);
                }
            }
            Err(e) if TOLERATED_EVENTS.contains(&event.name.as_str()) => {
                debug!(event = %event.signature, error = %e, "data payload skipped");
            }
            Err(e) => return Err(e),
        }
    }

    let parameters: Parameters = event
        .inputs
        .iter()
        .zip(slots)
        .filter_map(|(spec, value)| value.map(|v| (spec.name.clone(), v)))
        .collect();

    trace!(event = %event.signature, "decoded log");
    Ok(DecodedEvent {
        contract_address: normalizer::checksum(&log.address),
        name: event.name.clone(),
        signature: event.signature.clone(),
        topic_hex: event.topic_hex(),
        parameters,
        transaction_hash: log.transaction_hash.clone(),
        block_number: log.block_number,
        log_index: log.log_index,
    })
}

/// Decode a single indexed topic (always 32 bytes).
///
/// Value types are padded in place and decode directly. Reference types
/// (string, bytes, arrays, tuples) are stored as the keccak256 of their
/// encoding, so the hash itself is returned. A value that fails to decode
/// but looks like a left-padded address is read as one; anything else is
/// dropped.
fn decode_topic(spec: &ParamSpec, topic_hex: &str, opts: NormalizerOptions) -> Option<NormalizedValue> {
    let Some(word) = fingerprint::parse_topic(topic_hex) else {
        debug!(param = %spec.name, topic = %topic_hex, "malformed indexed topic");
        return None;
    };
    if spec.is_reference_type() {
        return Some(NormalizedValue::hex_bytes(word));
    }
    match spec.ty.abi_decode(&word) {
        Ok(value) => Some(normalizer::normalize_param(value, spec, opts)),
        Err(e) if word[..12].iter().all(|b| *b == 0) => {
            debug!(param = %spec.name, error = %e, "indexed value read as address");
            Some(NormalizedValue::ChecksumAddress(
                Address::from_slice(&word[12..]).to_checksum(None),
            ))
        }
        Err(e) => {
            debug!(param = %spec.name, error = %e, "indexed value omitted");
            None
        }
    }
}

fn decode_data(
    event: &EventSignature,
    specs: &[(usize, &ParamSpec)],
    data: &[u8],
    opts: NormalizerOptions,
) -> Result<Vec<(usize, NormalizedValue)>, DecodeError> {
    let tuple = DynSolType::Tuple(specs.iter().map(|(_, p)| p.ty.clone()).collect());
    let values = unpack(&tuple, data, &event.signature)?;
    Ok(specs
        .iter()
        .zip(values)
        .map(|((slot, spec), v)| (*slot, normalizer::normalize_param(v, spec, opts)))
        .collect())
}

fn decode_params(
    specs: &[ParamSpec],
    data: &[u8],
    signature: &str,
    opts: NormalizerOptions,
) -> Result<Parameters, DecodeError> {
    let tuple = DynSolType::Tuple(specs.iter().map(|p| p.ty.clone()).collect());
    let values = unpack(&tuple, data, signature)?;
    Ok(specs
        .iter()
        .zip(values)
        .map(|(spec, v)| (spec.name.clone(), normalizer::normalize_param(v, spec, opts)))
        .collect())
}

fn unpack(tuple: &DynSolType, data: &[u8], signature: &str) -> Result<Vec<DynSolValue>, DecodeError> {
    let decoded = tuple
        .abi_decode_params(data)
        .map_err(|e| DecodeError::AbiDecodeFailed {
            signature: signature.to_string(),
            reason: e.to_string(),
        })?;
    Ok(match decoded {
        DynSolValue::Tuple(vals) => vals,
        other => vec![other],
    })
}

// ─── Multi-interface search ─────────────────────────────────────────────────

/// Decode call data against each candidate in order; first success wins.
///
/// # Errors
/// - `NotConfigured` if `candidates` is empty
/// - the first `AbiDecodeFailed` if some candidate knew the selector
/// - `NoMatch` if none did
pub fn decode_method_any<I>(tx: &RawTransaction, candidates: I) -> Result<DecodedCall, DecodeError>
where
    I: IntoIterator,
    I::Item: AsRef<InterfaceDefinition>,
{
    search(candidates, |iface| decode_method(tx, iface))
}

/// Decode a log against each candidate in order; first success wins.
/// Errors as [`decode_method_any`].
pub fn decode_log_any<I>(log: &RawLog, candidates: I) -> Result<DecodedEvent, DecodeError>
where
    I: IntoIterator,
    I::Item: AsRef<InterfaceDefinition>,
{
    search(candidates, |iface| decode_log(log, iface))
}

fn search<I, T, F>(candidates: I, mut attempt: F) -> Result<T, DecodeError>
where
    I: IntoIterator,
    I::Item: AsRef<InterfaceDefinition>,
    F: FnMut(&InterfaceDefinition) -> Result<T, DecodeError>,
{
    let mut first_failure = None;
    let mut no_match = None;
    for (idx, candidate) in candidates.into_iter().enumerate() {
        match attempt(candidate.as_ref()) {
            Ok(decoded) => return Ok(decoded),
            Err(e @ DecodeError::AbiDecodeFailed { .. }) => {
                debug!(candidate = idx, error = %e, "candidate matched but failed to decode");
                first_failure.get_or_insert(e);
            }
            Err(e) if e.is_no_match() => {
                no_match = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(first_failure
        .or(no_match)
        .unwrap_or(DecodeError::NotConfigured))
}

/// Decode a batch of logs in parallel, keeping receipt order and dropping
/// logs that no candidate decodes.
pub fn decode_logs<D>(logs: &[RawLog], candidates: &[D]) -> Vec<DecodedEvent>
where
    D: AsRef<InterfaceDefinition> + Sync,
{
    logs.par_iter()
        .filter_map(|log| match decode_log_any(log, candidates) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!(log_index = log.log_index, error = %e, "log skipped");
                None
            }
        })
        .collect()
}

// ─── Contract binding ───────────────────────────────────────────────────────

/// A decoder bound to one interface and, optionally, one contract.
///
/// Returned by the metadata cache once a contract has been classified. When
/// a contract address is set, [`decode_logs`](Self::decode_logs) ignores
/// logs emitted by other contracts.
#[derive(Debug, Clone)]
pub struct ContractDecoder {
    contract_address: Option<String>,
    interface: Arc<InterfaceDefinition>,
    verified: bool,
    options: NormalizerOptions,
}

impl ContractDecoder {
    pub fn new(interface: Arc<InterfaceDefinition>) -> Self {
        Self {
            contract_address: None,
            interface,
            verified: false,
            options: NormalizerOptions::default(),
        }
    }

    pub fn with_contract(mut self, address: impl Into<String>) -> Self {
        self.contract_address = Some(normalizer::checksum(&address.into()));
        self
    }

    /// Mark the binding as backed by a bytecode-verified classification.
    pub fn with_verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    pub fn with_options(mut self, options: NormalizerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn contract_address(&self) -> Option<&str> {
        self.contract_address.as_deref()
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn interface(&self) -> &Arc<InterfaceDefinition> {
        &self.interface
    }

    pub fn decode_call(&self, tx: &RawTransaction) -> Result<DecodedCall, DecodeError> {
        decode_method_with(tx, &self.interface, self.options)
    }

    pub fn decode_log(&self, log: &RawLog) -> Result<DecodedEvent, DecodeError> {
        decode_log_with(log, &self.interface, self.options)
    }

    pub fn decode_logs(&self, logs: &[RawLog]) -> Vec<DecodedEvent> {
        logs.iter()
            .filter(|log| self.emitted_by_contract(log))
            .filter_map(|log| match self.decode_log(log) {
                Ok(event) => Some(event),
                Err(e) => {
                    debug!(log_index = log.log_index, error = %e, "log skipped");
                    None
                }
            })
            .collect()
    }

    fn emitted_by_contract(&self, log: &RawLog) -> bool {
        match &self.contract_address {
            Some(addr) => addr.eq_ignore_ascii_case(&log.address),
            None => true,
        }
    }
}
