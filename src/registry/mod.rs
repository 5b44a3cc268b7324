//! Schema descriptors for pullable atoms.
//!
//! The reconcile transform is schema-driven: for each tag id the registry
//! says where the identity lives (a scalar field or a repeated identity
//! chain) and which field positions are additive on merge. The registry is
//! an injected, read-only capability; it never changes underneath a running
//! transform.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::atom::TagId;

/// Where an atom schema keeps its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// A single integer identity field at a fixed 1-based position.
    Scalar { position: u32 },
    /// A repeated identity-chain structure rooted at the given 1-based
    /// position; every entry carries one identity slot.
    Chain { position: u32 },
}

/// Descriptor for one atom schema.
#[derive(Debug, Clone, Default)]
pub struct AtomSchema {
    /// Identity location, if the schema has one. Schemas without an
    /// identity are not subject to reconciliation.
    pub identity: Option<IdentityKind>,
    /// Top-level field positions summed when two atoms merge. Every other
    /// position must match exactly for a merge to happen.
    pub additive_fields: BTreeSet<u32>,
}

impl AtomSchema {
    pub fn new(identity: Option<IdentityKind>, additive: impl IntoIterator<Item = u32>) -> Self {
        Self {
            identity,
            additive_fields: additive.into_iter().collect(),
        }
    }

    /// True when the top-level position is summed on merge.
    pub fn is_additive(&self, position: u32) -> bool {
        self.additive_fields.contains(&position)
    }
}

/// Read-only schema lookup injected into the transform.
pub trait SchemaRegistry: Send + Sync {
    /// Descriptor for the given tag id, or `None` for unknown tags.
    fn schema(&self, tag_id: TagId) -> Option<&AtomSchema>;
}

/// In-memory registry backed by a plain map, built in code or loaded from a
/// YAML file.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    schemas: HashMap<TagId, AtomSchema>,
}

/// On-disk registry layout.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    atoms: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    tag_id: TagId,

    #[serde(default, with = "serde_yaml::with::singleton_map")]
    identity: Option<IdentityKind>,

    #[serde(default)]
    additive_fields: BTreeSet<u32>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema, replacing any previous descriptor for the tag.
    pub fn insert(&mut self, tag_id: TagId, schema: AtomSchema) {
        self.schemas.insert(tag_id, schema);
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Load a registry from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading registry file {}", path.display()))?;

        let file: RegistryFile = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing registry file {}", path.display()))?;

        Self::from_entries(file.atoms)
    }

    fn from_entries(entries: Vec<AtomEntry>) -> Result<Self> {
        let mut registry = Self::new();

        for entry in entries {
            if registry.schemas.contains_key(&entry.tag_id) {
                bail!("duplicate atom tag id: {}", entry.tag_id);
            }

            match entry.identity {
                Some(IdentityKind::Scalar { position }) | Some(IdentityKind::Chain { position })
                    if position == 0 =>
                {
                    bail!("atom {}: identity position must be 1-based", entry.tag_id);
                }
                _ => {}
            }

            if entry.additive_fields.contains(&0) {
                bail!(
                    "atom {}: additive field positions must be 1-based",
                    entry.tag_id
                );
            }

            registry.insert(
                entry.tag_id,
                AtomSchema {
                    identity: entry.identity,
                    additive_fields: entry.additive_fields,
                },
            );
        }

        Ok(registry)
    }
}

impl SchemaRegistry for StaticRegistry {
    fn schema(&self, tag_id: TagId) -> Option<&AtomSchema> {
        self.schemas.get(&tag_id)
    }
}
