//! JSON registry snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::model::{ExtensionDef, StructDef};
use crate::Registry;

/// In-memory registry loaded from a JSON snapshot.
///
/// Aliases are closed on construction: every name in an alias class lists
/// every other name, creating a bare entry when the snapshot omits one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    structs: BTreeMap<String, StructDef>,

    #[serde(default)]
    extensions: BTreeMap<String, ExtensionDef>,
}

impl RegistrySnapshot {
    /// Load a snapshot from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let contents = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json_str(contents: &str) -> Result<Self, RegistryError> {
        let raw: RegistrySnapshot = serde_json::from_str(contents)?;
        Ok(Self::from_parts(raw.structs, raw.extensions))
    }

    pub fn from_parts(
        structs: BTreeMap<String, StructDef>,
        extensions: BTreeMap<String, ExtensionDef>,
    ) -> Self {
        let mut snapshot = Self {
            structs,
            extensions,
        };
        snapshot.link_aliases();
        snapshot
    }

    /// Add or replace a struct.
    pub fn with_struct(mut self, name: impl Into<String>, def: StructDef) -> Self {
        self.structs.insert(name.into(), def);
        self.link_aliases();
        self
    }

    /// Add or replace an extension.
    pub fn with_extension(mut self, name: impl Into<String>, def: ExtensionDef) -> Self {
        self.extensions.insert(name.into(), def);
        self
    }

    pub fn struct_count(&self) -> usize {
        self.structs.len()
    }

    /// Close every alias class: each member lists every other member, so
    /// siblings that only share a core name still see each other.
    fn link_aliases(&mut self) {
        let mut edges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (name, def) in &self.structs {
            for alias in def.aliases.iter().filter(|alias| *alias != name) {
                edges.entry(name.clone()).or_default().insert(alias.clone());
                edges.entry(alias.clone()).or_default().insert(name.clone());
            }
        }

        let mut visited: BTreeSet<String> = BTreeSet::new();
        for start in edges.keys() {
            if visited.contains(start) {
                continue;
            }
            let mut class = vec![start.clone()];
            let mut pending = vec![start.as_str()];
            visited.insert(start.clone());
            while let Some(current) = pending.pop() {
                for next in edges.get(current).into_iter().flatten() {
                    if visited.insert(next.clone()) {
                        class.push(next.clone());
                        pending.push(next.as_str());
                    }
                }
            }

            for member in &class {
                let entry = self.structs.entry(member.clone()).or_default();
                for other in class.iter().filter(|other| *other != member) {
                    if !entry.aliases.contains(other) {
                        entry.aliases.push(other.clone());
                    }
                }
            }
        }
    }
}

impl Registry for RegistrySnapshot {
    fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(name)
    }

    fn extension(&self, name: &str) -> Option<&ExtensionDef> {
        self.extensions.get(name)
    }
}
