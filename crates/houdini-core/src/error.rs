//! Error types for houdini-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An allocation would run past the end of the scratch buffer.
    ///
    /// This is a fatal misconfiguration: the asset exposes more parameter
    /// storage than the configured scratch capacity.
    #[error("Scratch buffer overflow: {size} bytes at offset {offset} exceed capacity {capacity}")]
    ScratchOverflow {
        offset: usize,
        size: usize,
        capacity: usize,
    },

    #[error("Scratch access out of bounds: {size} bytes at offset {offset} (capacity {capacity})")]
    OutOfBounds {
        offset: usize,
        size: usize,
        capacity: usize,
    },

    #[error("Slot index {index} out of range for array of {len}")]
    SlotIndex { index: usize, len: usize },

    #[error("Unknown string handle: {0}")]
    UnknownString(u32),

    #[error("Invalid string encoding: {0}")]
    InvalidEncoding(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
