//! Error types for houdini-session

use thiserror::Error;

/// Non-success result of an engine call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HapiError {
    /// Generic failure
    #[error("Engine call failed")]
    Failure,

    /// Session was initialized twice
    #[error("Engine session already initialized")]
    AlreadyInitialized,

    /// No session is running
    #[error("Engine session not initialized")]
    NotInitialized,

    /// Asset library could not be loaded
    #[error("Cannot load file: {0}")]
    CantLoadFile(String),

    /// Parameter write was rejected
    #[error("Failed to set parameter {0}")]
    ParmSetFailed(i32),

    /// Argument out of range or otherwise invalid
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Geometry could not be extracted
    #[error("Cannot load geometry for asset {0}")]
    CantLoadGeo(i32),

    /// Handle (asset, node, string) does not exist
    #[error("Invalid handle {0}")]
    InvalidHandle(i32),
}

/// Result type for engine calls
pub type HapiResult<T> = std::result::Result<T, HapiError>;
