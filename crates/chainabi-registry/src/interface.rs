//! Parsed interface definitions.
//!
//! An `InterfaceDefinition` is built from a JSON ABI (a bare array of
//! entries, or a compiler artifact with an `"abi"` field) and holds two
//! tables keyed by entry name plus reverse indexes by selector and topic.
//!
//! Overloaded entries are keyed `name`, `name0`, `name1`, … in the order the
//! ABI lists them, so every overload stays addressable after a merge.

use std::collections::HashMap;

use alloy_core::dyn_abi::{DynSolType, Specifier};
use alloy_json_abi::{Event, EventParam, Function, JsonAbi, Param};
use chainabi_core::RegistryError;
use indexmap::IndexMap;

use crate::fingerprint;

/// One input or output parameter, with its type resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Declared name, or `arg{i}` when the ABI leaves it empty
    pub name: String,
    pub ty: DynSolType,
    /// Canonical type string, e.g. `uint256` or `(address,uint256)[]`
    pub type_name: String,
    /// Only meaningful for event inputs
    pub indexed: bool,
    /// Struct fields, for tuple and tuple-array types
    pub components: Vec<ParamSpec>,
}

impl ParamSpec {
    fn from_param(entry: &str, position: usize, p: &Param) -> Result<Self, RegistryError> {
        let ty = p.resolve().map_err(|_| RegistryError::UnknownType {
            entry: entry.to_string(),
            param: display_name(&p.name, position),
            ty: p.ty.clone(),
        })?;
        Ok(Self {
            name: display_name(&p.name, position),
            ty,
            type_name: p.selector_type().into_owned(),
            indexed: false,
            components: components(entry, &p.components)?,
        })
    }

    fn from_event_param(
        entry: &str,
        position: usize,
        p: &EventParam,
    ) -> Result<Self, RegistryError> {
        let ty = p.resolve().map_err(|_| RegistryError::UnknownType {
            entry: entry.to_string(),
            param: display_name(&p.name, position),
            ty: p.ty.clone(),
        })?;
        Ok(Self {
            name: display_name(&p.name, position),
            ty,
            type_name: p.selector_type().into_owned(),
            indexed: p.indexed,
            components: components(entry, &p.components)?,
        })
    }

    /// Types whose indexed topic holds a hash of the value, not the value.
    pub fn is_reference_type(&self) -> bool {
        matches!(
            self.ty,
            DynSolType::String
                | DynSolType::Bytes
                | DynSolType::Array(_)
                | DynSolType::FixedArray(..)
                | DynSolType::Tuple(_)
        )
    }
}

fn components(entry: &str, params: &[Param]) -> Result<Vec<ParamSpec>, RegistryError> {
    params
        .iter()
        .enumerate()
        .map(|(i, c)| ParamSpec::from_param(entry, i, c))
        .collect()
}

fn display_name(name: &str, position: usize) -> String {
    if name.is_empty() {
        format!("arg{position}")
    } else {
        name.to_string()
    }
}

/// A callable method of the interface.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub name: String,
    pub selector: [u8; 4],
    pub inputs: Vec<ParamSpec>,
    pub outputs: Vec<ParamSpec>,
    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub signature: String,
}

impl MethodSignature {
    fn from_function(f: &Function) -> Result<Self, RegistryError> {
        let signature = f.signature();
        let inputs = f
            .inputs
            .iter()
            .enumerate()
            .map(|(i, p)| ParamSpec::from_param(&signature, i, p))
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = f
            .outputs
            .iter()
            .enumerate()
            .map(|(i, p)| ParamSpec::from_param(&signature, i, p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: f.name.clone(),
            selector: fingerprint::selector(&signature),
            inputs,
            outputs,
            signature,
        })
    }

    pub fn selector_hex(&self) -> String {
        fingerprint::to_hex(&self.selector)
    }

    /// Tuple type of the inputs, as laid out in calldata after the selector.
    pub fn input_types(&self) -> Vec<DynSolType> {
        self.inputs.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn output_types(&self) -> Vec<DynSolType> {
        self.outputs.iter().map(|p| p.ty.clone()).collect()
    }
}

/// An event the interface can emit.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSignature {
    pub name: String,
    pub topic: [u8; 32],
    pub inputs: Vec<ParamSpec>,
    /// Canonical signature, e.g. `Transfer(address,address,uint256)`
    pub signature: String,
    pub anonymous: bool,
}

impl EventSignature {
    fn from_event(e: &Event) -> Result<Self, RegistryError> {
        let signature = e.signature();
        let inputs = e
            .inputs
            .iter()
            .enumerate()
            .map(|(i, p)| ParamSpec::from_event_param(&signature, i, p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: e.name.clone(),
            topic: fingerprint::topic(&signature),
            inputs,
            signature,
            anonymous: e.anonymous,
        })
    }

    pub fn topic_hex(&self) -> String {
        fingerprint::to_hex(&self.topic)
    }

    pub fn indexed_inputs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.inputs.iter().filter(|p| p.indexed)
    }

    pub fn data_inputs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.inputs.iter().filter(|p| !p.indexed)
    }
}

/// A parsed interface: method and event tables plus reverse indexes.
#[derive(Debug, Clone, Default)]
pub struct InterfaceDefinition {
    methods: IndexMap<String, MethodSignature>,
    events: IndexMap<String, EventSignature>,
    by_selector: HashMap<[u8; 4], String>,
    by_topic: HashMap<[u8; 32], String>,
}

impl InterfaceDefinition {
    /// Parse a JSON ABI document.
    pub fn parse(json: &str) -> Result<Self, RegistryError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let entries = match value {
            serde_json::Value::Object(mut artifact) => artifact.remove("abi").ok_or_else(|| {
                RegistryError::Parse("expected a JSON array or an object with an \"abi\" field".into())
            })?,
            other => other,
        };
        let abi: JsonAbi = serde_json::from_value(entries)?;
        Self::from_abi(&abi)
    }

    /// Build from an already-deserialized alloy `JsonAbi`.
    pub fn from_abi(abi: &JsonAbi) -> Result<Self, RegistryError> {
        let mut def = Self::default();
        for (name, overloads) in &abi.functions {
            for (i, f) in overloads.iter().enumerate() {
                def.methods
                    .insert(overload_key(name, i), MethodSignature::from_function(f)?);
            }
        }
        for (name, overloads) in &abi.events {
            for (i, e) in overloads.iter().enumerate() {
                def.events
                    .insert(overload_key(name, i), EventSignature::from_event(e)?);
            }
        }
        def.reindex();
        Ok(def)
    }

    /// Union of `self` and `other`. On a key collision the entry from
    /// `other` replaces the one from `self`.
    pub fn merge(&self, other: &InterfaceDefinition) -> InterfaceDefinition {
        let mut merged = self.clone();
        for (key, method) in &other.methods {
            merged.methods.insert(key.clone(), method.clone());
        }
        for (key, event) in &other.events {
            merged.events.insert(key.clone(), event.clone());
        }
        merged.reindex();
        merged
    }

    /// Fold a list of definitions left to right; later ones win collisions.
    pub fn merge_all<'a>(defs: impl IntoIterator<Item = &'a InterfaceDefinition>) -> Self {
        defs.into_iter()
            .fold(InterfaceDefinition::default(), |acc, d| acc.merge(d))
    }

    fn reindex(&mut self) {
        self.by_selector.clear();
        self.by_topic.clear();
        for (key, m) in &self.methods {
            self.by_selector
                .entry(m.selector)
                .or_insert_with(|| key.clone());
        }
        for (key, e) in &self.events {
            if !e.anonymous {
                self.by_topic.entry(e.topic).or_insert_with(|| key.clone());
            }
        }
    }

    pub fn method_by_selector(&self, selector: [u8; 4]) -> Option<&MethodSignature> {
        self.by_selector
            .get(&selector)
            .and_then(|key| self.methods.get(key))
    }

    pub fn event_by_topic(&self, topic: &[u8; 32]) -> Option<&EventSignature> {
        self.by_topic.get(topic).and_then(|key| self.events.get(key))
    }

    /// Look up a method by table key (`transfer`, `safeTransferFrom0`, …).
    pub fn method(&self, key: &str) -> Option<&MethodSignature> {
        self.methods.get(key)
    }

    pub fn event(&self, key: &str) -> Option<&EventSignature> {
        self.events.get(key)
    }

    pub fn methods(&self) -> impl Iterator<Item = (&str, &MethodSignature)> {
        self.methods.iter().map(|(k, m)| (k.as_str(), m))
    }

    pub fn events(&self) -> impl Iterator<Item = (&str, &EventSignature)> {
        self.events.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// `0x`-prefixed selectors of every method.
    pub fn selectors(&self) -> Vec<String> {
        by_length(self.methods.values().map(|m| m.selector_hex()).collect())
    }

    /// `0x`-prefixed topics of every non-anonymous event.
    pub fn topics(&self) -> Vec<String> {
        by_length(
            self.events
                .values()
                .filter(|e| !e.anonymous)
                .map(|e| e.topic_hex())
                .collect(),
        )
    }

    /// Canonical signatures of methods and events.
    pub fn signatures(&self) -> Vec<String> {
        by_length(
            self.methods
                .values()
                .map(|m| m.signature.clone())
                .chain(self.events.values().map(|e| e.signature.clone()))
                .collect(),
        )
    }

    /// Bare lowercase hex fragments that deployed bytecode implementing this
    /// interface would contain: method selectors then event topics.
    pub fn fragments(&self) -> Vec<String> {
        self.methods
            .values()
            .map(|m| hex::encode(m.selector))
            .chain(
                self.events
                    .values()
                    .filter(|e| !e.anonymous)
                    .map(|e| hex::encode(e.topic)),
            )
            .collect()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.events.is_empty()
    }
}

/// Listings are ordered shortest first; equal lengths keep table order.
fn by_length(mut items: Vec<String>) -> Vec<String> {
    items.sort_by_key(|s| s.len());
    items
}

impl AsRef<InterfaceDefinition> for InterfaceDefinition {
    fn as_ref(&self) -> &InterfaceDefinition {
        self
    }
}

fn overload_key(name: &str, index: usize) -> String {
    match index {
        0 => name.to_string(),
        n => format!("{name}{}", n - 1),
    }
}

/// First candidate (in order) whose method index contains `selector`.
pub fn lookup_method<'a, I>(selector: [u8; 4], candidates: I) -> Option<&'a MethodSignature>
where
    I: IntoIterator<Item = &'a InterfaceDefinition>,
{
    candidates
        .into_iter()
        .find_map(|def| def.method_by_selector(selector))
}

/// First candidate (in order) whose event index contains `topic`.
pub fn lookup_event<'a, I>(topic: &[u8; 32], candidates: I) -> Option<&'a EventSignature>
where
    I: IntoIterator<Item = &'a InterfaceDefinition>,
{
    candidates.into_iter().find_map(|def| def.event_by_topic(topic))
}
