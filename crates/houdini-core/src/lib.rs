//! Houdini Core - Shared types for the Houdini Engine asset component
//!
//! This crate provides the data model every other crate builds on:
//! - Dynamic parameter values (`ParameterValue`, `Color`)
//! - Identities for assets, nodes, parameters, fields and requests
//! - Parameter descriptors produced by schema reflection
//! - A fixed-capacity, bounds-checked scratch arena for field storage
//! - Metadata keys and name sanitization used by generated schemas
//! - Transcoding between engine-native strings and Rust strings
//!
//! ## Scratch Arena
//!
//! Field values live in a fixed-size byte buffer owned by each component.
//! Offsets are handed out by `ScratchAllocator`, which aligns every slot and
//! refuses to hand out space past the end of the buffer:
//! ```
//! use houdini_core::{ScratchAllocator, ScratchBuffer};
//!
//! let mut buffer = ScratchBuffer::new(16);
//! let mut alloc = ScratchAllocator::new(buffer.capacity());
//! let slot = alloc.allocate::<f32>(2).unwrap();
//! buffer.write(&slot, 1, 4.0f32).unwrap();
//! assert_eq!(buffer.read(&slot, 1).unwrap(), 4.0);
//! assert!(alloc.allocate::<f32>(4).is_err());
//! ```

mod descriptor;
pub mod encoding;
mod error;
mod geometry;
mod guid;
mod identity;
pub mod meta;
mod scratch;
mod value;

pub use descriptor::{Choice, ChoiceBacking, ParameterDescriptor, ParameterKind, RangeHints};
pub use error::{Error, Result};
pub use geometry::{Bounds, MeshData};
pub use guid::{CorrelationId, CorrelationIdGenerator};
pub use identity::{AssetId, AssetPath, ComponentId, FieldId, NodeId, ParmId};
pub use meta::MetaData;
pub use scratch::{align_up, ScratchAllocator, ScratchBuffer, ScratchValue, Slot, StringHandle};
pub use value::{Color, ParameterValue};
