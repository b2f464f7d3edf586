//! Component configuration
//!
//! Loaded from RON; every field has a default so partial files are valid:
//!
//! ```
//! use houdini_component::ComponentConfig;
//!
//! let config = ComponentConfig::from_ron_str("(scratch_capacity: 8192)").unwrap();
//! assert_eq!(config.scratch_capacity, 8192);
//! assert_eq!(config.poll_interval_ms, 250);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings shared by every asset component of a world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    /// Fixed size of each component's scratch buffer in bytes
    pub scratch_capacity: usize,
    /// Poll cadence while a request or pending edits exist
    pub poll_interval_ms: u64,
    /// Category tag of reflected fields; edits outside it are ignored
    pub category: String,
    /// Static type name, the prefix of generated schema names
    pub class_name: String,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            scratch_capacity: 4096,
            poll_interval_ms: 250,
            category: "HoudiniProperties".to_string(),
            class_name: "HoudiniAssetComponent".to_string(),
        }
    }
}

impl ComponentConfig {
    /// Parse and validate a RON document
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.scratch_capacity == 0 {
            return Err(Error::Config("scratch_capacity must be positive".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be positive".into()));
        }
        if self.category.is_empty() {
            return Err(Error::Config("category must not be empty".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
