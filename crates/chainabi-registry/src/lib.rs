//! # chainabi-registry
//!
//! Parsing, merging and indexing of JSON ABI interface definitions.
//!
//! ## Example
//! ```no_run
//! use chainabi_registry::AbiRegistry;
//! use std::path::Path;
//!
//! let mut registry = AbiRegistry::with_defaults()?;
//! registry.load_directory(Path::new("./abis"))?;
//! println!("{} interfaces loaded", registry.len());
//! # Ok::<(), chainabi_core::RegistryError>(())
//! ```

pub mod builtin;
pub mod fingerprint;
pub mod interface;
pub mod registry;

pub use builtin::StandardInterfaces;
pub use interface::{
    lookup_event, lookup_method, EventSignature, InterfaceDefinition, MethodSignature, ParamSpec,
};
pub use registry::AbiRegistry;
