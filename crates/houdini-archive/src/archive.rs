//! The persisted layout of one asset component
//!
//! An archive starts with the component's lifecycle tag. An `Invalid`
//! component stores nothing else. Every other state also stores the asset
//! reference, the scratch buffer verbatim (with the capacity it was written
//! with and the strings its string fields point at), one record per
//! generated field, and the last cooked mesh.

use crate::error::{Error, Result};
use houdini_component::{AssetComponent, ComponentState, GeneratedSchema};
use houdini_core::{AssetPath, Choice, MeshData, MetaData, ParameterKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Layout version written by this crate
pub const ARCHIVE_VERSION: u32 = 1;

/// One generated field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedProperty {
    pub kind: ParameterKind,
    /// Engine parameter name; field names are derived again on load
    pub name: String,
    pub flags: u64,
    pub arity: usize,
    pub element_size: usize,
    pub offset: usize,
    pub changed: bool,
    pub meta: MetaData,
    /// Choice entries of an enumeration
    pub choices: Option<Vec<Choice>>,
}

/// Saved state of one asset component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentArchive {
    pub version: u32,
    pub state: ComponentState,
    pub asset: Option<AssetPath>,
    /// Capacity of the buffer the scratch bytes were copied from
    pub scratch_capacity: usize,
    pub scratch: Vec<u8>,
    /// String pool referenced by string fields
    pub strings: Vec<String>,
    pub properties: Vec<SerializedProperty>,
    pub mesh: Option<MeshData>,
}

fn properties_of(schema: &GeneratedSchema) -> Vec<SerializedProperty> {
    schema
        .fields()
        .iter()
        .map(|field| SerializedProperty {
            kind: field.kind,
            name: field.parm_name().to_string(),
            flags: field.flags,
            arity: field.arity,
            element_size: field.element_size,
            offset: field.offset,
            changed: field.is_changed(),
            meta: field.meta.clone(),
            choices: schema.enum_of(field).map(|e| e.choices()),
        })
        .collect()
}

impl ComponentArchive {
    /// Archive of a component with nothing worth saving
    pub fn invalid() -> Self {
        Self {
            version: ARCHIVE_VERSION,
            state: ComponentState::Invalid,
            asset: None,
            scratch_capacity: 0,
            scratch: Vec::new(),
            strings: Vec::new(),
            properties: Vec::new(),
            mesh: None,
        }
    }

    /// Capture the persistent state of `component`
    pub fn save(component: &AssetComponent) -> Self {
        let state = component.save_state();
        if state == ComponentState::Invalid {
            return Self::invalid();
        }

        let scratch = component.scratch();
        let properties = component.schema().map(properties_of).unwrap_or_default();
        let mesh = Some(component.mesh()).filter(|m| !m.is_logo).cloned();

        debug!(
            component = %component.id(),
            state = ?state,
            properties = properties.len(),
            "saving component"
        );
        Self {
            version: ARCHIVE_VERSION,
            state,
            asset: component.asset().map(|a| a.path().clone()),
            scratch_capacity: scratch.capacity(),
            scratch: scratch.as_bytes().to_vec(),
            strings: scratch.strings().to_vec(),
            properties,
            mesh,
        }
    }

    /// Encode to the binary archive format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Decode from the binary archive format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let archive: Self = bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))?;
        if archive.version != ARCHIVE_VERSION {
            return Err(Error::UnsupportedVersion(archive.version));
        }
        Ok(archive)
    }

    /// Export as human readable RON
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn from_ron(source: &str) -> Result<Self> {
        let archive: Self = ron::from_str(source).map_err(|e| Error::Serialization(e.to_string()))?;
        if archive.version != ARCHIVE_VERSION {
            return Err(Error::UnsupportedVersion(archive.version));
        }
        Ok(archive)
    }

    /// Write the binary archive to a file
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(&fs::read(path)?)
    }
}
