//! Error types for houdini-archive

use houdini_core::AssetPath;
use thiserror::Error;

/// Archive error type
#[derive(Debug, Error)]
pub enum Error {
    /// The package holding the referenced asset cannot be found or loaded
    #[error("Package not found: {0}")]
    MissingPackage(String),

    /// The package exists but has no asset of that name
    #[error("Asset not found: {0}")]
    MissingAsset(AssetPath),

    /// A valid component state was stored without an asset reference
    #[error("Archive has no asset reference")]
    MissingAssetPath,

    /// The stored scratch buffer does not fit the configured capacity
    #[error("Stored scratch buffer of {stored} bytes exceeds capacity {capacity}")]
    ScratchTooLarge { stored: usize, capacity: usize },

    #[error("Unsupported archive version: {0}")]
    UnsupportedVersion(u32),

    /// Encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The component rejected the restored state
    #[error("Component error: {0}")]
    Component(#[from] houdini_component::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, Error>;
