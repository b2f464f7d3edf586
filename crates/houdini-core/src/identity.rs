//! Identity types for assets, engine nodes, parameters and synthesized fields

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of an instantiated procedural asset inside the external engine
///
/// `-1` means "not instantiated".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub i32);

impl AssetId {
    /// The "not instantiated" handle
    pub const INVALID: AssetId = AssetId(-1);

    /// Create a new asset handle
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the raw handle value
    pub fn raw(&self) -> i32 {
        self.0
    }

    /// Check whether this handle refers to an instantiated asset
    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset:{}", self.0)
    }
}

/// Node identifier inside the external engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i32);

/// Parameter identifier inside the external engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParmId(pub i32);

impl ParmId {
    /// Returned by name lookups that found nothing
    pub const INVALID: ParmId = ParmId(-1);

    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }
}

/// Identity of a synthesized field within one generated schema
///
/// Stable across rebuilds for a given parameter name, so edits recorded
/// while a cook is in flight still point at the right field afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(pub u32);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field:{}", self.0)
    }
}

/// Identity of a component instance in the host world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub u64);

impl ComponentId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component:{}", self.0)
    }
}

/// Location of a procedural asset definition in host storage
///
/// Persisted instead of the asset object itself; resolved again on load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPath {
    /// Container (package) holding the asset
    pub package: String,
    /// Asset name within the package
    pub name: String,
}

impl AssetPath {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_id_validity() {
        assert!(!AssetId::INVALID.is_valid());
        assert!(!AssetId::default().is_valid());
        assert!(AssetId::new(0).is_valid());
        assert_eq!(AssetId::new(7).raw(), 7);
        assert_eq!(format!("{}", AssetId::new(7)), "asset:7");
    }

    #[test]
    fn test_parm_id_validity() {
        assert!(!ParmId::INVALID.is_valid());
        assert!(ParmId(3).is_valid());
    }

    #[test]
    fn test_asset_path_display() {
        let path = AssetPath::new("/Game/Assets", "rock_generator");
        assert_eq!(format!("{}", path), "/Game/Assets.rock_generator");
    }
}
