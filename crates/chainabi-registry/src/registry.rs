//! `AbiRegistry`: an ordered collection of named interface definitions.
//!
//! Order matters: multi-interface decoding walks the registry front to back
//! and the first definition that resolves a selector or topic wins.
//! A registry is built once and then shared read-only behind an `Arc`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chainabi_core::RegistryError;
use tracing::debug;

use crate::builtin;
use crate::interface::InterfaceDefinition;

#[derive(Debug, Clone, Default)]
pub struct AbiRegistry {
    entries: Vec<(String, Arc<InterfaceDefinition>)>,
}

impl AbiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the bundled standard interfaces, in the
    /// order `erc20, erc721, erc1155, weth, erc20votes`.
    pub fn with_defaults() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (name, json) in builtin::BUILTIN_ABIS {
            registry.register_json(name, json)?;
        }
        Ok(registry)
    }

    /// Append a definition under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        def: InterfaceDefinition,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(RegistryError::AlreadyExists { name });
        }
        debug!(
            interface = %name,
            methods = def.method_count(),
            events = def.event_count(),
            "registered interface"
        );
        self.entries.push((name, Arc::new(def)));
        Ok(())
    }

    /// Parse `json` and append it under `name`.
    pub fn register_json(&mut self, name: impl Into<String>, json: &str) -> Result<(), RegistryError> {
        let def = InterfaceDefinition::parse(json)?;
        self.register(name, def)
    }

    /// Load one ABI file; it is registered under its file stem.
    pub fn load_file(&mut self, path: &Path) -> Result<(), RegistryError> {
        let content = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| RegistryError::Parse(format!("{} has no file name", path.display())))?;
        self.register_json(name, &content)
    }

    /// Load every `.json` file directly under `dir`, in file-name order.
    /// Returns the number of interfaces loaded.
    pub fn load_directory(&mut self, dir: &Path) -> Result<usize, RegistryError> {
        let files = json_files(dir)?;
        for path in &files {
            self.load_file(path)?;
        }
        Ok(files.len())
    }

    /// Definitions in search order.
    pub fn candidates(&self) -> Vec<Arc<InterfaceDefinition>> {
        self.entries.iter().map(|(_, d)| Arc::clone(d)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InterfaceDefinition)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d.as_ref()))
    }

    pub fn get(&self, name: &str) -> Option<Arc<InterfaceDefinition>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| Arc::clone(d))
    }

    /// Like [`get`](Self::get) but an error when absent.
    pub fn require(&self, name: &str) -> Result<Arc<InterfaceDefinition>, RegistryError> {
        self.get(name).ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
        })
    }

    /// Union of every definition, later entries winning collisions.
    pub fn merged(&self) -> InterfaceDefinition {
        InterfaceDefinition::merge_all(self.entries.iter().map(|(_, d)| d.as_ref()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    if !dir.is_dir() {
        return Err(RegistryError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        )));
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
